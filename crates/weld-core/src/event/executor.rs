//! 异步观察者执行器

use futures::future::join_all;
use parking_lot::Mutex;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context as TaskContext, Poll};
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use weld_common::{ExecutorSettings, ObserverException, ObserverFailure};

/// 异步观察者执行器
///
/// 持有独立的 tokio 运行时; 观察者是阻塞的用户代码, 放在阻塞线程池中运行,
/// 池的大小与空闲保活时间来自配置。
pub struct AsyncExecutor {
    runtime: Mutex<Option<Runtime>>,
    handle: Handle,
    stopped: AtomicBool,
}

impl AsyncExecutor {
    /// 按配置创建执行器
    pub fn new(settings: &ExecutorSettings) -> std::io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(settings.thread_pool_size.max(1))
            .thread_keep_alive(settings.keep_alive())
            .thread_name("weld-worker")
            .enable_all()
            .build()?;
        info!(
            "异步观察者执行器启动: 线程池大小 {}",
            settings.thread_pool_size
        );
        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Mutex::new(Some(runtime)),
            stopped: AtomicBool::new(false),
        })
    }

    /// 使用外部运行时, 执行器不负责其关闭
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            runtime: Mutex::new(None),
            handle,
            stopped: AtomicBool::new(false),
        }
    }

    /// 是否已停止
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// 并行执行一组阻塞任务, 返回按任务顺序汇总失败的投递句柄
    pub fn deliver<F>(&self, tasks: Vec<(String, F)>) -> AsyncEventDelivery
    where
        F: FnOnce() -> Result<(), ObserverFailure> + Send + 'static,
    {
        if tasks.is_empty() {
            return AsyncEventDelivery::completed();
        }
        if self.is_stopped() {
            let failures = tasks
                .into_iter()
                .map(|(observer, _)| ObserverFailure {
                    observer,
                    message: "异步执行器已停止".to_string(),
                })
                .collect();
            return AsyncEventDelivery::failed(failures);
        }

        let handle = self.handle.clone();
        let join = self.handle.spawn(async move {
            let (names, spawned): (Vec<String>, Vec<JoinHandle<Result<(), ObserverFailure>>>) =
                tasks
                    .into_iter()
                    .map(|(name, task)| (name, handle.spawn_blocking(task)))
                    .unzip();
            let results = join_all(spawned).await;
            let failures: Vec<ObserverFailure> = names
                .into_iter()
                .zip(results)
                .filter_map(|(observer, result)| match result {
                    Ok(Ok(())) => None,
                    Ok(Err(failure)) => Some(failure),
                    Err(join_error) => Some(ObserverFailure {
                        observer,
                        message: join_error.to_string(),
                    }),
                })
                .collect();
            match ObserverException::from_failures(failures) {
                Some(exception) => Err(exception),
                None => Ok(()),
            }
        });
        AsyncEventDelivery {
            state: DeliveryState::Running(join),
        }
    }

    /// 停止执行器, 正在运行的任务在后台结束; 可重复调用
    pub fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(runtime) = self.runtime.lock().take() {
            debug!("关闭异步观察者执行器");
            runtime.shutdown_background();
        }
    }
}

impl Drop for AsyncExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for AsyncExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncExecutor")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

enum DeliveryState {
    Running(JoinHandle<Result<(), ObserverException>>),
    Ready(Option<Result<(), ObserverException>>),
}

/// 异步事件投递的完成句柄
///
/// 所有异步观察者完成或失败后完成; 失败时给出按观察者顺序汇总的复合异常。
#[must_use = "投递句柄需要等待才能观察到观察者失败"]
pub struct AsyncEventDelivery {
    state: DeliveryState,
}

impl AsyncEventDelivery {
    fn completed() -> Self {
        Self {
            state: DeliveryState::Ready(Some(Ok(()))),
        }
    }

    fn failed(failures: Vec<ObserverFailure>) -> Self {
        let result = match ObserverException::from_failures(failures) {
            Some(exception) => Err(exception),
            None => Ok(()),
        };
        Self {
            state: DeliveryState::Ready(Some(result)),
        }
    }

    /// 取消投递, 尚未开始的观察者不再执行
    pub fn abort(&self) {
        if let DeliveryState::Running(join) = &self.state {
            join.abort();
        }
    }

    /// 是否已经完成
    pub fn is_finished(&self) -> bool {
        match &self.state {
            DeliveryState::Running(join) => join.is_finished(),
            DeliveryState::Ready(_) => true,
        }
    }
}

impl Future for AsyncEventDelivery {
    type Output = Result<(), ObserverException>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            DeliveryState::Running(join) => Pin::new(join).poll(cx).map(|result| match result {
                Ok(outcome) => outcome,
                Err(join_error) => Err(ObserverException {
                    primary: ObserverFailure {
                        observer: "异步事件投递".to_string(),
                        message: join_error.to_string(),
                    },
                    suppressed: Vec::new(),
                }),
            }),
            DeliveryState::Ready(result) => Poll::Ready(result.take().unwrap_or(Ok(()))),
        }
    }
}

impl std::fmt::Debug for AsyncEventDelivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncEventDelivery")
            .field("finished", &self.is_finished())
            .finish()
    }
}
