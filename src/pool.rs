//! 连接池
//!
//! 持有一组有界的空闲连接：空闲则复用，未到上限则发放建连许可，
//! 到上限则让调用方排队。连接关闭时释放名额并唤醒排队者。
//! 池与连接之间是单向所有权：池持有空闲连接的 `Rc`，连接通过
//! `Weak` 回指池的共享状态，不构成引用环。

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::future::Future;
use std::rc::Rc;

use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::connection::RedisConnection;
use crate::error::RedisError;

/// 发给排队者的槽位
enum PoolSlot {
    /// 一条刚被归还的健康连接
    Ready(Rc<RedisConnection>),
    /// 一个建连许可，名额已预留
    Permit,
}

/// 同步取用的结果
enum Checkout {
    Ready(Rc<RedisConnection>),
    Permit,
    Wait(oneshot::Receiver<PoolSlot>),
}

/// 池的共享状态；连接经 `Weak` 回指它
pub struct PoolShared {
    max_connections: usize,
    idle: RefCell<VecDeque<Rc<RedisConnection>>>,
    /// 打开的连接数（含在用的）加已发放的建连许可
    total: Cell<usize>,
    waiters: RefCell<VecDeque<oneshot::Sender<PoolSlot>>>,
    shut_down: Cell<bool>,
}

impl PoolShared {
    fn new(max_connections: usize) -> Self {
        Self {
            max_connections,
            idle: RefCell::new(VecDeque::new()),
            total: Cell::new(0),
            waiters: RefCell::new(VecDeque::new()),
            shut_down: Cell::new(false),
        }
    }

    fn checkout(&self) -> Result<Checkout, RedisError> {
        if self.shut_down.get() {
            return Err(RedisError::PoolShutDown);
        }

        while let Some(connection) = self.idle.borrow_mut().pop_front() {
            if connection.is_closed() {
                // 名额已在连接关闭时释放，这里只是丢弃残骸
                continue;
            }
            connection.set_in_pool(false);
            debug!("reusing idle connection, total {}", self.total.get());
            return Ok(Checkout::Ready(connection));
        }

        if self.total.get() < self.max_connections {
            self.total.set(self.total.get() + 1);
            debug!("opening connection {}/{}", self.total.get(), self.max_connections);
            return Ok(Checkout::Permit);
        }

        debug!("pool exhausted ({} connections), queueing caller", self.total.get());
        let (tx, rx) = oneshot::channel();
        self.waiters.borrow_mut().push_back(tx);
        Ok(Checkout::Wait(rx))
    }

    /// 归还一条连接
    ///
    /// 只接受健康的连接：没有在途命令、没有敞开的事务、未关闭、
    /// 也不在池里。有排队者时直接移交，否则转入空闲队列。
    pub(crate) fn release(&self, connection: Rc<RedisConnection>) -> Result<(), RedisError> {
        if connection.outstanding() > 0 {
            return Err(RedisError::CannotReturnToPool("there are ongoing commands"));
        }
        if connection.in_transaction() {
            return Err(RedisError::CannotReturnToPool("transaction is open"));
        }
        if connection.is_closed() {
            return Err(RedisError::ConnectionClosed);
        }
        if connection.in_pool() {
            return Err(RedisError::ConnectionInPool);
        }

        if self.shut_down.get() {
            connection.close();
            return Ok(());
        }

        let mut connection = connection;
        loop {
            let waiter = self.waiters.borrow_mut().pop_front();
            match waiter {
                Some(waiter) => match waiter.send(PoolSlot::Ready(connection)) {
                    Ok(()) => {
                        debug!("handed returned connection to a queued caller");
                        return Ok(());
                    }
                    // 排队者已放弃等待，把连接拿回来试下一个
                    Err(PoolSlot::Ready(returned)) => connection = returned,
                    Err(PoolSlot::Permit) => unreachable!("sent a Ready slot"),
                },
                None => {
                    connection.set_in_pool(true);
                    self.idle.borrow_mut().push_back(connection);
                    debug!("connection returned to pool");
                    return Ok(());
                }
            }
        }
    }

    /// 连接关闭时的回调：释放名额，必要时给排队者发建连许可
    pub(crate) fn on_connection_close(&self) {
        self.total.set(self.total.get().saturating_sub(1));
        debug!("connection slot released, total {}", self.total.get());
        self.grant_permit();
    }

    fn grant_permit(&self) {
        if self.shut_down.get() {
            return;
        }
        loop {
            let waiter = self.waiters.borrow_mut().pop_front();
            match waiter {
                Some(waiter) => {
                    if waiter.send(PoolSlot::Permit).is_ok() {
                        self.total.set(self.total.get() + 1);
                        return;
                    }
                }
                None => return,
            }
        }
    }

    fn shutdown(&self) {
        if self.shut_down.replace(true) {
            return;
        }
        let idle: Vec<_> = self.idle.borrow_mut().drain(..).collect();
        let waiters: Vec<_> = self.waiters.borrow_mut().drain(..).collect();
        info!("shutting down pool with {} idle connections", idle.len());
        for connection in idle {
            connection.set_in_pool(false);
            connection.close();
        }
        // 丢弃发送端，排队者以 PoolShutDown 失败
        drop(waiters);
    }
}

/// 有界连接池
///
/// 池本身不知道怎么建连接；`acquire` 的调用方提供建连函数，
/// 只有拿到许可时才会执行。
pub struct ConnectionPool {
    shared: Rc<PoolShared>,
}

impl ConnectionPool {
    pub fn new(max_connections: usize) -> Self {
        Self {
            shared: Rc::new(PoolShared::new(max_connections)),
        }
    }

    /// 取得一条连接：复用空闲、按需新建，或在到达上限时排队等待
    pub async fn acquire<F, Fut>(&self, connect: F) -> Result<Rc<RedisConnection>, RedisError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Rc<RedisConnection>, RedisError>>,
    {
        let slot = match self.shared.checkout()? {
            Checkout::Ready(connection) => return Ok(connection),
            Checkout::Permit => PoolSlot::Permit,
            Checkout::Wait(rx) => rx.await.map_err(|_| RedisError::PoolShutDown)?,
        };

        match slot {
            PoolSlot::Ready(connection) => Ok(connection),
            PoolSlot::Permit => match connect().await {
                Ok(connection) => {
                    connection.attach_pool(Rc::downgrade(&self.shared));
                    Ok(connection)
                }
                Err(cause) => {
                    // 建连失败，释放预留的名额
                    self.shared.on_connection_close();
                    Err(cause)
                }
            },
        }
    }

    /// 归还一条连接；见 [`PoolShared::release`]
    pub fn release(&self, connection: Rc<RedisConnection>) -> Result<(), RedisError> {
        self.shared.release(connection)
    }

    /// 关闭所有空闲连接并拒绝后续取用
    pub fn shutdown(&self) {
        self.shared.shutdown();
    }

    pub fn idle_count(&self) -> usize {
        self.shared.idle.borrow().len()
    }

    pub fn total_count(&self) -> usize {
        self.shared.total.get()
    }
}
