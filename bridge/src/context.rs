//! # 后台任务上下文

use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::{
    sync::{Mutex, Notify, watch},
    task::JoinSet,
};
use tracing::{error, info};

/// 等待 Ctrl-C 或 SIGTERM 信号
pub async fn shutdown_signal() {
    let ctrl_c = async {
        match tokio::signal::ctrl_c().await {
            Ok(_) => info!("收到 Ctrl-C 信号"),
            Err(e) => {
                error!("监听 Ctrl-C 信号失败: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
                info!("收到 SIGTERM 信号");
            }
            Err(e) => {
                error!("监听 SIGTERM 信号失败: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// 等待关闭通知
///
/// 通知在调用前已发出，或上下文已释放时立即返回。
pub async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// 上下文结构
pub struct Context {
    initiated: AtomicBool,
    tasks: Mutex<JoinSet<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl Context {
    /// 构造上下文
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            initiated: AtomicBool::new(false),
            tasks: Mutex::new(JoinSet::new()),
            shutdown_tx: watch::channel(false).0,
        })
    }

    /// 收到关闭信号时优雅退出
    pub fn watch(self: &Arc<Self>) {
        let ctx = Arc::clone(self);
        tokio::spawn(async move {
            shutdown_signal().await;
            ctx.shutdown().await;
        });
    }

    /// 启用后台任务
    ///
    /// 任务获得就绪通知与关闭通知，本方法在任务发出就绪通知后返回。
    pub async fn spawn<F, Fut>(&self, task: F)
    where
        F: FnOnce(Arc<Notify>, watch::Receiver<bool>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut tasks = self.tasks.lock().await;
        let shutdown = self.shutdown_tx.subscribe();
        let ready = Arc::new(Notify::new());
        let waiter = Arc::clone(&ready);
        tasks.spawn(task(ready, shutdown));
        waiter.notified().await;
    }

    /// 关闭通知，供不在上下文中运行的循环使用
    pub fn notifier(&self) -> watch::Receiver<bool> {
        self.shutdown_tx.subscribe()
    }

    /// 是否已开始关闭
    pub fn is_shutdown(&self) -> bool {
        self.initiated.load(Ordering::SeqCst)
    }

    /// 优雅关闭
    pub async fn shutdown(&self) {
        if self
            .initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
            .is_ok()
        {
            info!("开始优雅退出");
            self.shutdown_tx.send_replace(true);
            self.join().await;
            info!("优雅退出所有后台任务");
        }
    }

    /// 等待所有后台任务结束
    pub async fn all_done(&self) {
        self.join().await;
    }

    async fn join(&self) {
        let mut tasks = self.tasks.lock().await;
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                error!("后台任务发生错误：{e}");
            }
        }
    }
}
