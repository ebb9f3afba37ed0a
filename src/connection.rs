//! 连接状态机
//!
//! 整个驱动的核心：把并发提交的命令复用到一条双工字节流上，同时保证
//! 第 i 条命令由第 i 条响应回答。实现上依赖三条不变式：
//!
//! 1. 提交是同步的：门禁检查、waiter 入队、事务状态更新、命令进入
//!    写通道都发生在第一个挂起点之前，同一个 tick 内的提交顺序就是
//!    上线顺序。
//! 2. 写任务独占消息层的写半边，按通道顺序写出，通道排空时统一冲刷。
//! 3. 收取任务在 `receive_queue` 非空期间持有读半边，每个未完成的
//!    waiter 恰好消费一条响应，队列排空后让出读半边。
//!
//! 事务（MULTI..EXEC）期间每条命令产生两个 waiter：排队 waiter 校验
//! 服务端的 `+QUEUED` 确认，结果 waiter 挂在 `transaction_queue` 里
//! 等 EXEC 的结果数组逐个分发。generation 计数器把中途放弃的事务和
//! 后续事务隔离开。

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Notify};
use tracing::{trace, warn};

use crate::charset::Charset;
use crate::command::{Command, RedisCommand};
use crate::error::RedisError;
use crate::messaging::{MessagingReader, MessagingWriter, RedisMessaging};
use crate::parse;
use crate::pool::PoolShared;
use crate::response::RedisResponse;

/// generation 计数器的起始值；计数从第一个 MULTI 开始递增
const NO_TRANSACTION: u64 = 0;

type ResponseResult = Result<RedisResponse, RedisError>;
type ExecResult = Result<Option<Vec<RedisResponse>>, RedisError>;

/// `receive_queue` 中的待配对响应槽
enum ReceiveWaiter {
    /// 普通命令：原始响应直接交给提交方
    Plain(oneshot::Sender<ResponseResult>),
    /// 事务内命令的排队确认：必须是 `+QUEUED`，否则整代事务作废
    Queued(u64),
    /// EXEC 的终端响应：结果数组在这里分发给各结果 waiter
    Exec(u64, oneshot::Sender<ExecResult>),
    /// DISCARD 的响应：先放弃整代事务再交回响应
    Discard(u64, oneshot::Sender<ResponseResult>),
}

/// 事务内命令的结果 waiter，按入队顺序挂在 `transaction_queue`
struct ResultWaiter {
    generation: u64,
    tx: oneshot::Sender<ResponseResult>,
}

/// 同步提交的结果：响应接收端和它是否属于事务
struct Submitted {
    rx: oneshot::Receiver<ResponseResult>,
    transactional: bool,
}

/// 写任务的输入
enum WriteOp {
    Command(RedisCommand),
    /// 半关闭写方向，完成后通过回执通知
    EndOfStream(oneshot::Sender<()>),
}

/// 状态机的可变部分，单线程亲和，借用从不跨越挂起点
struct ConnectionState {
    receive_queue: VecDeque<ReceiveWaiter>,
    transaction_queue: VecDeque<ResultWaiter>,
    /// 每次 MULTI 递增
    transaction_generation: u64,
    /// 每次 EXEC/DISCARD 推进；与 transaction_generation 的差即
    /// 未关闭的事务数（标准 Redis 下至多为 1）
    completed_generation: u64,
    /// 当前敞开的 MULTI 的 generation
    open_transaction: Option<u64>,
    /// 排队阶段出错后记录的作废原因，EXEC 到达时使用
    doomed: Option<(u64, RedisError)>,
}

/// 一条到 Redis 服务器的连接
///
/// 连接亲和于单个执行器（`!Send`），所有方法必须在创建它的
/// `LocalSet` 上调用。跨核扩展通过多个执行器各带各的连接池实现。
pub struct RedisConnection {
    charset: Charset,
    request_timeout: Option<Duration>,
    state: RefCell<ConnectionState>,
    /// 收取任务未运行时读半边停在这里
    reader: RefCell<Option<MessagingReader>>,
    receiving: Cell<bool>,
    closed: Cell<bool>,
    in_pool: Cell<bool>,
    write_tx: mpsc::UnboundedSender<WriteOp>,
    close_notify: Rc<Notify>,
    pool: RefCell<Weak<PoolShared>>,
}

impl RedisConnection {
    /// 在消息层之上建立连接，启动写任务
    pub fn new(messaging: RedisMessaging, charset: Charset) -> Rc<Self> {
        Self::with_request_timeout(messaging, charset, None)
    }

    pub fn with_request_timeout(
        messaging: RedisMessaging,
        charset: Charset,
        request_timeout: Option<Duration>,
    ) -> Rc<Self> {
        let (reader, writer) = messaging.into_split();
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let close_notify = Rc::new(Notify::new());

        let connection = Rc::new(Self {
            charset,
            request_timeout,
            state: RefCell::new(ConnectionState {
                receive_queue: VecDeque::new(),
                transaction_queue: VecDeque::new(),
                transaction_generation: NO_TRANSACTION,
                completed_generation: NO_TRANSACTION,
                open_transaction: None,
                doomed: None,
            }),
            reader: RefCell::new(Some(reader)),
            receiving: Cell::new(false),
            closed: Cell::new(false),
            in_pool: Cell::new(false),
            write_tx,
            close_notify: Rc::clone(&close_notify),
            pool: RefCell::new(Weak::new()),
        });

        tokio::task::spawn_local(write_loop(
            writer,
            write_rx,
            Rc::downgrade(&connection),
            close_notify,
        ));
        connection
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    /// 是否有敞开的 MULTI
    pub fn in_transaction(&self) -> bool {
        self.state.borrow().open_transaction.is_some()
    }

    /// 尚未收到响应的协议级请求数
    pub fn outstanding(&self) -> usize {
        self.state.borrow().receive_queue.len()
    }

    pub(crate) fn in_pool(&self) -> bool {
        self.in_pool.get()
    }

    pub(crate) fn set_in_pool(&self, in_pool: bool) {
        self.in_pool.set(in_pool);
    }

    pub(crate) fn attach_pool(&self, pool: Weak<PoolShared>) {
        *self.pool.borrow_mut() = pool;
    }

    // === 提交路径 ===

    /// 发送一条命令并用解析器把原始响应转成类型化结果
    ///
    /// 提交（入队、上线）在本方法返回 future 之前已经完成，
    /// 只有等待响应是挂起的，因此可以先囤多个 future 再一起 await
    /// 来做流水线。
    pub(crate) fn send<T, F>(
        self: &Rc<Self>,
        command: RedisCommand,
        parser: F,
    ) -> impl Future<Output = Result<T, RedisError>>
    where
        F: FnOnce(RedisResponse) -> Result<T, RedisError>,
    {
        let submitted = self.submit(command);
        let request_timeout = self.request_timeout;
        async move {
            let submitted = submitted?;
            // 事务内命令的结果要等 EXEC 才揭晓，不适用请求超时
            let request_timeout = if submitted.transactional {
                None
            } else {
                request_timeout
            };
            let response = await_waiter(request_timeout, submitted.rx).await?;
            parser(response)
        }
    }

    /// 同步提交：门禁、waiter 入队、交给写任务
    fn submit(self: &Rc<Self>, command: RedisCommand) -> Result<Submitted, RedisError> {
        self.gate()?;

        let (tx, rx) = oneshot::channel();
        let transactional = {
            let mut state = self.state.borrow_mut();
            match state.open_transaction {
                Some(generation) => {
                    trace!("sending command {} as part of transaction #{}", command, generation);
                    state.receive_queue.push_back(ReceiveWaiter::Queued(generation));
                    state
                        .transaction_queue
                        .push_back(ResultWaiter { generation, tx });
                    true
                }
                None => {
                    trace!("sending command {}", command);
                    state.receive_queue.push_back(ReceiveWaiter::Plain(tx));
                    false
                }
            }
        };
        self.enqueue_write(command)?;
        Ok(Submitted { rx, transactional })
    }

    fn gate(&self) -> Result<(), RedisError> {
        if self.closed.get() {
            return Err(RedisError::ConnectionClosed);
        }
        if self.in_pool.get() {
            return Err(RedisError::ConnectionInPool);
        }
        Ok(())
    }

    fn enqueue_write(self: &Rc<Self>, command: RedisCommand) -> Result<(), RedisError> {
        if self.write_tx.send(WriteOp::Command(command)).is_err() {
            return Err(RedisError::ConnectionClosed);
        }
        self.ensure_receiving();
        Ok(())
    }

    // === 事务 ===

    /// 开启一个事务
    pub fn multi(self: &Rc<Self>) -> impl Future<Output = Result<(), RedisError>> {
        let submitted = self.gate().and_then(|_| {
            if self.in_transaction() {
                return Err(RedisError::TransactionMisuse("nested MULTI call"));
            }
            // MULTI 本身按普通命令发送，它之后的命令才进入事务
            let submitted = self.submit(RedisCommand::new(Command::Multi))?;
            let mut state = self.state.borrow_mut();
            state.transaction_generation += 1;
            state.open_transaction = Some(state.transaction_generation);
            state.doomed = None;
            trace!("transaction #{} has been started", state.transaction_generation);
            Ok(submitted.rx)
        });
        let request_timeout = self.request_timeout;
        async move {
            let response = await_waiter(request_timeout, submitted?).await?;
            parse::expect_ok(response)
        }
    }

    /// 执行事务
    ///
    /// 解析为 `Some(原始响应列表)`，或者在被 WATCH 的 key 变化导致
    /// 事务失败时解析为 `None`（各命令 future 则以
    /// [`RedisError::TransactionFailed`] 失败）。
    pub fn exec(self: &Rc<Self>) -> impl Future<Output = Result<Option<Vec<RedisResponse>>, RedisError>> {
        let submitted = self.gate().and_then(|_| {
            let generation = {
                let mut state = self.state.borrow_mut();
                let Some(generation) = state.open_transaction.take() else {
                    return Err(RedisError::TransactionMisuse("EXEC without MULTI"));
                };
                state.completed_generation = generation;
                generation
            };
            trace!("executing transaction #{}", generation);

            let (tx, rx) = oneshot::channel();
            self.state
                .borrow_mut()
                .receive_queue
                .push_back(ReceiveWaiter::Exec(generation, tx));
            self.enqueue_write(RedisCommand::new(Command::Exec))?;
            Ok(rx)
        });
        let request_timeout = self.request_timeout;
        async move { await_waiter(request_timeout, submitted?).await }
    }

    /// 放弃事务：所有已排队命令的 future 以
    /// [`RedisError::TransactionDiscarded`] 失败
    pub fn discard(self: &Rc<Self>) -> impl Future<Output = Result<(), RedisError>> {
        let submitted = self.gate().and_then(|_| {
            let generation = {
                let mut state = self.state.borrow_mut();
                let Some(generation) = state.open_transaction.take() else {
                    return Err(RedisError::TransactionMisuse("DISCARD without MULTI"));
                };
                state.completed_generation = generation;
                generation
            };
            trace!("transaction #{} is being discarded", generation);

            let (tx, rx) = oneshot::channel();
            self.state
                .borrow_mut()
                .receive_queue
                .push_back(ReceiveWaiter::Discard(generation, tx));
            self.enqueue_write(RedisCommand::new(Command::Discard))?;
            Ok(rx)
        });
        let request_timeout = self.request_timeout;
        async move {
            let response = await_waiter(request_timeout, submitted?).await?;
            parse::expect_ok(response)
        }
    }

    /// 退出：放弃所有未关闭的事务，发送 QUIT，半关闭写方向并关闭连接
    pub fn quit(self: &Rc<Self>) -> impl Future<Output = Result<(), RedisError>> {
        let submitted = self.gate().and_then(|_| {
            let mut aborted = Vec::new();
            {
                let mut state = self.state.borrow_mut();
                state.open_transaction = None;
                state.doomed = None;
                while state.completed_generation < state.transaction_generation {
                    state.completed_generation += 1;
                    let generation = state.completed_generation;
                    drain_generation(&mut state.transaction_queue, generation, &mut aborted);
                }
            }
            for waiter in aborted {
                let _ = waiter.tx.send(Err(RedisError::QuitCalled));
            }
            self.submit(RedisCommand::new(Command::Quit)).map(|s| s.rx)
        });
        let connection = Rc::clone(self);
        async move {
            let response = await_waiter(connection.request_timeout, submitted?).await?;
            parse::expect_ok(response)?;

            let (ack_tx, ack_rx) = oneshot::channel();
            if connection
                .write_tx
                .send(WriteOp::EndOfStream(ack_tx))
                .is_ok()
            {
                let _ = ack_rx.await;
            }
            connection.close();
            Ok(())
        }
    }

    // === 关闭与归还 ===

    /// 优雅关闭；等价于 `close_with(ConnectionClosed)`
    pub fn close(&self) {
        self.close_with(RedisError::ConnectionClosed);
    }

    /// 以给定原因关闭连接
    ///
    /// 幂等。所有未完成的 waiter（接收队列和事务队列）以同一个原因
    /// 失败，写任务和收取任务被唤醒退出，连接池得到通知。
    pub fn close_with(&self, cause: RedisError) {
        if self.closed.replace(true) {
            return;
        }

        let (receive_queue, transaction_queue) = {
            let mut state = self.state.borrow_mut();
            state.open_transaction = None;
            state.doomed = None;
            (
                std::mem::take(&mut state.receive_queue),
                std::mem::take(&mut state.transaction_queue),
            )
        };
        if matches!(cause, RedisError::ConnectionClosed) {
            trace!("closing connection {:?}", self);
        } else {
            warn!(
                "closing connection with {} outstanding and {} transactional waiters: {}",
                receive_queue.len(),
                transaction_queue.len(),
                cause
            );
        }

        for waiter in receive_queue {
            match waiter {
                ReceiveWaiter::Plain(tx) => {
                    let _ = tx.send(Err(cause.clone()));
                }
                ReceiveWaiter::Queued(_) => {}
                ReceiveWaiter::Exec(_, tx) => {
                    let _ = tx.send(Err(cause.clone()));
                }
                ReceiveWaiter::Discard(_, tx) => {
                    let _ = tx.send(Err(cause.clone()));
                }
            }
        }
        for waiter in transaction_queue {
            let _ = waiter.tx.send(Err(cause.clone()));
        }

        self.close_notify.notify_waiters();
        if let Some(pool) = self.pool.borrow().upgrade() {
            pool.on_connection_close();
        }
    }

    /// 把连接归还给所属的连接池
    ///
    /// 只有健康的连接（没有在途命令、没有敞开的事务、未关闭）可以
    /// 归还；否则返回错误，连接留在调用方手里。
    pub fn return_to_pool(self: &Rc<Self>) -> Result<(), RedisError> {
        let pool = self.pool.borrow().upgrade().ok_or(RedisError::CannotReturnToPool(
            "connection does not belong to a pool",
        ))?;
        pool.release(Rc::clone(self))
    }

    // === 接收路径 ===

    /// 保证队列非空时有且只有一个在途的 receive
    fn ensure_receiving(self: &Rc<Self>) {
        if self.receiving.get() || self.closed.get() {
            return;
        }
        if self.state.borrow().receive_queue.is_empty() {
            return;
        }
        let Some(mut reader) = self.reader.borrow_mut().take() else {
            return;
        };
        self.receiving.set(true);

        let connection = Rc::clone(self);
        tokio::task::spawn_local(async move {
            // 迭代式排空：同步可用的响应在循环里逐个分发，不递归
            loop {
                let received = tokio::select! {
                    received = reader.receive() => received,
                    _ = connection.close_notify.notified() => return,
                };
                match received {
                    Ok(response) => connection.dispatch(response),
                    Err(cause) => {
                        connection.receiving.set(false);
                        connection.close_with(cause);
                        return;
                    }
                }
                if connection.closed.get() {
                    return;
                }
                if connection.state.borrow().receive_queue.is_empty() {
                    break;
                }
            }
            // 队列排空，让出读半边等待下一轮提交
            *connection.reader.borrow_mut() = Some(reader);
            connection.receiving.set(false);
        });
    }

    /// 把一条响应配对给队首 waiter
    fn dispatch(&self, response: RedisResponse) {
        let waiter = self.state.borrow_mut().receive_queue.pop_front();
        match waiter {
            None => {
                if !self.closed.get() {
                    self.close_with(RedisError::Protocol(
                        "received a response with no pending command".to_string(),
                    ));
                }
            }
            Some(ReceiveWaiter::Plain(tx)) => {
                trace!("received response {}", response);
                let _ = tx.send(Ok(response));
            }
            Some(ReceiveWaiter::Queued(generation)) => {
                self.on_queued_response(generation, response);
            }
            Some(ReceiveWaiter::Exec(generation, tx)) => {
                self.on_exec_response(generation, tx, response);
            }
            Some(ReceiveWaiter::Discard(generation, tx)) => {
                self.abort_generation(generation, RedisError::TransactionDiscarded);
                let _ = tx.send(Ok(response));
            }
        }
    }

    /// 校验事务内命令的排队确认
    fn on_queued_response(&self, generation: u64, response: RedisResponse) {
        if self.is_doomed(generation) {
            // 事务已作废，后续排队响应只是消费掉
            return;
        }
        let cause = match response {
            RedisResponse::SimpleString(ref s) if s == "QUEUED" => {
                trace!("command queued in transaction #{}", generation);
                return;
            }
            RedisResponse::Error { code, message } => RedisError::Server { code, message },
            other => other.unexpected("QUEUED"),
        };
        self.doom_generation(generation, cause);
    }

    /// EXEC 的终端响应：分发结果数组或放弃整代事务
    fn on_exec_response(
        &self,
        generation: u64,
        tx: oneshot::Sender<ExecResult>,
        response: RedisResponse,
    ) {
        if let Some(cause) = self.take_doomed(generation) {
            let aborted = RedisError::TransactionAborted(Box::new(cause));
            self.abort_generation(generation, aborted.clone());
            let _ = tx.send(Err(aborted));
            return;
        }

        match response {
            RedisResponse::NilArray | RedisResponse::Nil => {
                // 被 WATCH 的 key 发生变化，服务端放弃了事务
                self.abort_generation(generation, RedisError::TransactionFailed);
                let _ = tx.send(Ok(None));
            }
            RedisResponse::Error { code, message } => {
                let cause = RedisError::Server { code, message };
                self.abort_generation(generation, cause.clone());
                let _ = tx.send(Err(cause));
            }
            RedisResponse::Array(items) => {
                let waiters = self.take_generation(generation);
                if items.len() != waiters.len() {
                    // 状态机已无法配对结果和命令，必须关闭连接
                    let cause = RedisError::FramingMismatch {
                        expected: waiters.len(),
                        received: items.len(),
                    };
                    for waiter in waiters {
                        let _ = waiter.tx.send(Err(cause.clone()));
                    }
                    let _ = tx.send(Err(cause.clone()));
                    self.close_with(cause);
                    return;
                }
                trace!(
                    "completing transaction #{} with {} results",
                    generation,
                    items.len()
                );
                for (waiter, item) in waiters.into_iter().zip(items.iter()) {
                    let _ = waiter.tx.send(Ok(item.clone()));
                }
                let _ = tx.send(Ok(Some(items)));
            }
            other => {
                let cause = other.unexpected("EXEC result array");
                self.abort_generation(generation, cause.clone());
                let _ = tx.send(Err(cause));
            }
        }
    }

    fn is_doomed(&self, generation: u64) -> bool {
        matches!(self.state.borrow().doomed, Some((doomed, _)) if doomed == generation)
    }

    fn take_doomed(&self, generation: u64) -> Option<RedisError> {
        let mut state = self.state.borrow_mut();
        if matches!(state.doomed, Some((doomed, _)) if doomed == generation) {
            state.doomed.take().map(|(_, cause)| cause)
        } else {
            None
        }
    }

    /// 记下作废原因（第一个错误胜出）并立刻放弃该代的结果 waiter
    fn doom_generation(&self, generation: u64, cause: RedisError) {
        trace!("transaction #{} is doomed: {}", generation, cause);
        self.state
            .borrow_mut()
            .doomed
            .get_or_insert((generation, cause.clone()));
        self.abort_generation(
            generation,
            RedisError::TransactionAborted(Box::new(cause)),
        );
    }

    /// 让指定代的所有结果 waiter 以同一个原因失败
    fn abort_generation(&self, generation: u64, cause: RedisError) {
        let mut aborted = Vec::new();
        drain_generation(
            &mut self.state.borrow_mut().transaction_queue,
            generation,
            &mut aborted,
        );
        if !aborted.is_empty() {
            trace!(
                "aborting {} waiters of transaction #{}: {}",
                aborted.len(),
                generation,
                cause
            );
        }
        for waiter in aborted {
            let _ = waiter.tx.send(Err(cause.clone()));
        }
    }

    /// 取出指定代的所有结果 waiter，保持入队顺序
    fn take_generation(&self, generation: u64) -> Vec<ResultWaiter> {
        let mut taken = Vec::new();
        drain_generation(
            &mut self.state.borrow_mut().transaction_queue,
            generation,
            &mut taken,
        );
        taken
    }
}

impl fmt::Debug for RedisConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("RedisConnection")
            .field("charset", &self.charset)
            .field("receive_queue", &state.receive_queue.len())
            .field("transaction_queue", &state.transaction_queue.len())
            .field("transactions", &state.transaction_generation)
            .field("completed_transactions", &state.completed_generation)
            .field("closed", &self.closed.get())
            .field("in_pool", &self.in_pool.get())
            .finish()
    }
}

/// 从事务队列头部弹出属于指定代的 waiter
fn drain_generation(
    queue: &mut VecDeque<ResultWaiter>,
    generation: u64,
    drained: &mut Vec<ResultWaiter>,
) {
    while let Some(head) = queue.front() {
        if head.generation != generation {
            break;
        }
        drained.push(queue.pop_front().expect("head exists"));
    }
}

/// 等待 waiter 完成，可选地与计时器竞争
///
/// 超时不会把 waiter 从队列中移除（移除会破坏 FIFO 配对），
/// 响应到达时 waiter 被静默满足。
async fn await_waiter<T>(
    request_timeout: Option<Duration>,
    rx: oneshot::Receiver<Result<T, RedisError>>,
) -> Result<T, RedisError> {
    match request_timeout {
        Some(limit) => match tokio::time::timeout(limit, rx).await {
            Ok(result) => result.unwrap_or(Err(RedisError::ConnectionClosed)),
            Err(_) => Err(RedisError::Timeout),
        },
        None => rx.await.unwrap_or(Err(RedisError::ConnectionClosed)),
    }
}

/// 写任务：独占写半边，按提交顺序写出，通道排空时冲刷
async fn write_loop(
    mut writer: MessagingWriter,
    mut write_rx: mpsc::UnboundedReceiver<WriteOp>,
    connection: Weak<RedisConnection>,
    close_notify: Rc<Notify>,
) {
    let fail = |cause: RedisError| {
        if let Some(connection) = connection.upgrade() {
            connection.close_with(cause);
        }
    };

    loop {
        // 关闭通知可能在写出期间错过，回到循环顶部时补查一次
        if connection.upgrade().map_or(true, |c| c.is_closed()) {
            return;
        }
        let op = tokio::select! {
            op = write_rx.recv() => op,
            _ = close_notify.notified() => return,
        };
        let Some(mut op) = op else { return };

        loop {
            match op {
                WriteOp::Command(command) => {
                    if let Err(cause) = writer.write_command(&command).await {
                        fail(cause);
                        return;
                    }
                }
                WriteOp::EndOfStream(ack) => {
                    let _ = writer.finish().await;
                    let _ = ack.send(());
                    return;
                }
            }
            match write_rx.try_recv() {
                Ok(next) => op = next,
                Err(_) => break,
            }
        }
        if let Err(cause) = writer.flush().await {
            fail(cause);
            return;
        }
    }
}
