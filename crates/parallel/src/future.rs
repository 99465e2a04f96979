// future.rs
// Future句柄：外部任务的挂起/完成结果句柄，以及按块序汇聚的组合Future。
use crate::error::{Error, Result};
use std::sync::mpsc::Receiver;

/// 外部任务结果句柄，提交时创建，汇聚时消费
/// join 阻塞等待任务完成并返回该块的结果列表
pub struct FutureHandle<R> {
    receiver: Receiver<Result<Vec<R>>>,
}

impl<R> FutureHandle<R> {
    /// 由运行时在提交任务时创建，接收端即任务结果通道
    pub fn new(receiver: Receiver<Result<Vec<R>>>) -> Self {
        Self { receiver }
    }

    /// 阻塞等待任务完成
    /// 任务内部的失败在这里浮出；执行端退出导致通道关闭同样视为执行错误
    pub fn join(self) -> Result<Vec<R>> {
        match self.receiver.recv() {
            Ok(result) => result,
            Err(_) => Err(Error::Execution("任务执行端已退出，结果通道关闭".to_string())),
        }
    }
}

/// 组合Future：覆盖一次调度的全部块句柄
/// 汇聚结果按块序排列（不展平），块i的结果始终位于位置i
pub struct CombinedFuture<R> {
    handles: Vec<FutureHandle<R>>,
    end_msg: Option<String>,
    done_callback: Option<Box<dyn FnOnce(&str) + Send>>,
}

impl<R> CombinedFuture<R> {
    pub fn new(handles: Vec<FutureHandle<R>>) -> Self {
        Self {
            handles,
            end_msg: None,
            done_callback: None,
        }
    }

    /// 设置汇聚成功时输出的固定消息
    pub fn with_end_msg(mut self, end_msg: String) -> Self {
        self.end_msg = Some(end_msg);
        self
    }

    /// 设置完成回调，汇聚成功时以固定消息调用
    /// 未设置回调而设置了消息时，消息直接打印
    pub fn on_done(&mut self, callback: impl FnOnce(&str) + Send + 'static) {
        self.done_callback = Some(Box::new(callback));
    }

    /// 块数
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// 阻塞等待所有块完成，返回按块序排列的各块结果列表
    /// 任一块失败时返回按块序遇到的第一个错误，已完成的块结果被丢弃
    pub fn join(self) -> Result<Vec<Vec<R>>> {
        let CombinedFuture {
            handles,
            end_msg,
            done_callback,
        } = self;

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.join()?);
        }
        if let Some(msg) = end_msg {
            match done_callback {
                Some(callback) => callback(&msg),
                None => println!("{}", msg),
            }
        }
        Ok(results)
    }
}
