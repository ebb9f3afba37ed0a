//! 连接池集成测试

mod common;

use std::rc::Rc;

use anyhow::Result;
use tokio::net::TcpStream;
use tokio::task::LocalSet;

use common::{command_words, Step, StubServer};
use redis_lite::{
    Charset, ConnectionPool, RedisClient, RedisConfig, RedisConnection, RedisError,
    RedisMessaging,
};

fn client_for(server: &StubServer) -> RedisClient {
    RedisClient::with_config(RedisConfig::new(server.address()))
}

#[tokio::test]
async fn test_release_and_reuse() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            // 桩服务器只接受一条连接，复用失败会在这里卡住
            let server = StubServer::start(vec![
                Step::ExpectCommands(1),
                Step::write(b"+PONG\r\n"),
                Step::ExpectCommands(1),
                Step::write(b"+PONG\r\n"),
            ])
            .await?;
            let client = client_for(&server);

            let conn = client.get_connection().await?;
            conn.ping().await?;
            client.return_connection(Rc::clone(&conn))?;

            let reused = client.get_connection().await?;
            assert!(Rc::ptr_eq(&conn, &reused));
            reused.ping().await?;
            Ok(())
        })
        .await
}

#[tokio::test]
async fn test_in_pool_connection_rejects_submissions() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let server = StubServer::start(vec![]).await?;
            let client = client_for(&server);

            let conn = client.get_connection().await?;
            client.return_connection(Rc::clone(&conn))?;

            // 归还之后还握着旧 Rc 也不能再用
            assert!(matches!(
                conn.ping().await,
                Err(RedisError::ConnectionInPool)
            ));
            assert!(matches!(
                client.return_connection(Rc::clone(&conn)),
                Err(RedisError::ConnectionInPool)
            ));
            Ok(())
        })
        .await
}

#[tokio::test]
async fn test_release_with_outstanding_commands_rejected() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let server = StubServer::start(vec![
                Step::ExpectCommands(1),
                Step::write(b"+PONG\r\n"),
            ])
            .await?;
            let client = client_for(&server);

            let conn = client.get_connection().await?;
            let pending = conn.ping();

            assert!(matches!(
                client.return_connection(Rc::clone(&conn)),
                Err(RedisError::CannotReturnToPool(_))
            ));

            pending.await?;
            client.return_connection(conn)?;
            Ok(())
        })
        .await
}

#[tokio::test]
async fn test_release_inside_transaction_rejected() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let server = StubServer::start(vec![
                Step::ExpectCommands(1),
                Step::write(b"+OK\r\n"),
            ])
            .await?;
            let client = client_for(&server);

            let conn = client.get_connection().await?;
            conn.multi().await?;

            assert!(matches!(
                client.return_connection(Rc::clone(&conn)),
                Err(RedisError::CannotReturnToPool(_))
            ));
            Ok(())
        })
        .await
}

#[tokio::test]
async fn test_queued_acquirer_receives_released_connection() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let server = StubServer::start(vec![
                Step::ExpectCommands(1),
                Step::write(b"+PONG\r\n"),
            ])
            .await?;
            let client = Rc::new(RedisClient::with_config(
                RedisConfig::new(server.address()).with_max_connections(1),
            ));

            let conn = client.get_connection().await?;

            // 池已满，第二个取用者排队
            let queued = {
                let client = Rc::clone(&client);
                tokio::task::spawn_local(async move { client.get_connection().await })
            };
            tokio::task::yield_now().await;

            client.return_connection(Rc::clone(&conn))?;
            let handed = queued.await?.map_err(anyhow::Error::from)?;
            assert!(Rc::ptr_eq(&conn, &handed));

            handed.ping().await?;
            Ok(())
        })
        .await
}

#[tokio::test]
async fn test_shutdown_closes_idle_and_rejects_acquire() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let server = StubServer::start(vec![]).await?;
            let client = client_for(&server);

            let conn = client.get_connection().await?;
            client.return_connection(Rc::clone(&conn))?;

            client.shutdown();
            assert!(conn.is_closed());
            assert!(matches!(
                client.get_connection().await,
                Err(RedisError::PoolShutDown)
            ));
            Ok(())
        })
        .await
}

#[tokio::test]
async fn test_connect_failure_releases_slot() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let server = StubServer::start(vec![
                Step::ExpectCommands(1),
                Step::write(b"+PONG\r\n"),
            ])
            .await?;
            let pool = ConnectionPool::new(1);

            let failed = pool
                .acquire(|| async { Err(RedisError::Timeout) })
                .await;
            assert!(matches!(failed, Err(RedisError::Timeout)));
            assert_eq!(pool.total_count(), 0);

            // 名额已释放，上限为 1 也还能建新连接
            let address = server.address();
            let conn = pool
                .acquire(|| async move {
                    let stream = TcpStream::connect(address).await?;
                    Ok(RedisConnection::new(
                        RedisMessaging::new(stream),
                        Charset::Utf8,
                    ))
                })
                .await
                .map_err(anyhow::Error::from)?;
            assert_eq!(pool.total_count(), 1);
            conn.ping().await.map_err(anyhow::Error::from)?;
            Ok(())
        })
        .await
}

#[tokio::test]
async fn test_connect_handshake_applies_auth_and_select() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let server = StubServer::start(vec![
                Step::ExpectCommands(1),
                Step::write(b"+OK\r\n"),
                Step::ExpectCommands(1),
                Step::write(b"+OK\r\n"),
                Step::ExpectCommands(1),
                Step::write(b"+PONG\r\n"),
            ])
            .await?;
            let client = RedisClient::with_config(
                RedisConfig::new(server.address())
                    .with_username("svc")
                    .with_password("secret")
                    .with_database_index(2),
            );

            let conn = client.get_connection().await?;
            conn.ping().await?;
            drop(conn);

            let inbound = server.finish().await?;
            assert_eq!(command_words(&inbound[0]), vec!["AUTH", "svc", "secret"]);
            assert_eq!(command_words(&inbound[1]), vec!["SELECT", "2"]);
            assert_eq!(command_words(&inbound[2]), vec!["PING"]);
            Ok(())
        })
        .await
}

#[tokio::test]
async fn test_closed_connection_cannot_be_returned() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let server = StubServer::start(vec![]).await?;
            let client = client_for(&server);

            let conn = client.get_connection().await?;
            conn.close();

            assert!(matches!(
                client.return_connection(conn),
                Err(RedisError::ConnectionClosed)
            ));
            Ok(())
        })
        .await
}
