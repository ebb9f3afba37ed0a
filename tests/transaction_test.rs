//! 事务语义集成测试
//!
//! MULTI..EXEC 的成功、WATCH 失败、排队阶段出错、DISCARD、
//! 帧不匹配和 QUIT 的各条路径。

mod common;

use anyhow::Result;
use tokio::task::LocalSet;

use common::{command_words, Step, StubServer};
use redis_lite::{RedisClient, RedisConfig, RedisError, RedisResponse};

fn client_for(server: &StubServer) -> RedisClient {
    RedisClient::with_config(RedisConfig::new(server.address()))
}

#[tokio::test]
async fn test_transaction_success() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let server = StubServer::start(vec![
                Step::ExpectCommands(1),
                Step::write(b"+OK\r\n"),
                Step::ExpectCommands(3),
                Step::write(b"+QUEUED\r\n+QUEUED\r\n*2\r\n+OK\r\n:2\r\n"),
            ])
            .await?;
            let client = client_for(&server);
            let conn = client.get_connection().await?;

            conn.multi().await?;
            let set = conn.set("k", "1", &[]);
            let incr = conn.incr("k");
            let exec = conn.exec();

            // 结果 waiter 按入队顺序由 EXEC 的数组逐个满足
            assert_eq!(set.await?, Some("OK".to_string()));
            assert_eq!(incr.await?, 2);
            let results = exec.await?.expect("transaction executed");
            assert_eq!(
                results,
                vec![
                    RedisResponse::SimpleString("OK".to_string()),
                    RedisResponse::Integer(2),
                ]
            );

            let inbound = server.finish().await?;
            assert_eq!(command_words(&inbound[0]), vec!["MULTI"]);
            assert_eq!(command_words(&inbound[1]), vec!["SET", "k", "1"]);
            assert_eq!(command_words(&inbound[2]), vec!["INCR", "k"]);
            assert_eq!(command_words(&inbound[3]), vec!["EXEC"]);
            Ok(())
        })
        .await
}

#[tokio::test]
async fn test_transaction_watched_key_failure() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let server = StubServer::start(vec![
                Step::ExpectCommands(1),
                Step::write(b"+OK\r\n"),
                Step::ExpectCommands(2),
                Step::write(b"+QUEUED\r\n*-1\r\n"),
                Step::ExpectCommands(1),
                Step::write(b"+PONG\r\n"),
            ])
            .await?;
            let client = client_for(&server);
            let conn = client.get_connection().await?;

            conn.multi().await?;
            let set = conn.set("k", "v", &[]);
            let exec = conn.exec();

            assert!(matches!(set.await, Err(RedisError::TransactionFailed)));
            assert_eq!(exec.await?, None);

            // 连接保持打开
            assert!(!conn.is_closed());
            assert_eq!(conn.ping().await?, "PONG");
            Ok(())
        })
        .await
}

#[tokio::test]
async fn test_transaction_error_mid_queue() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let server = StubServer::start(vec![
                Step::ExpectCommands(1),
                Step::write(b"+OK\r\n"),
                Step::ExpectCommands(3),
                Step::write(
                    b"-ERR unknown command\r\n+QUEUED\r\n-EXECABORT Transaction discarded because of previous errors.\r\n",
                ),
                Step::ExpectCommands(1),
                Step::write(b"+PONG\r\n"),
            ])
            .await?;
            let client = client_for(&server);
            let conn = client.get_connection().await?;

            conn.multi().await?;
            let first = conn.set("k", "1", &[]);
            let second = conn.incr("k");
            let exec = conn.exec();

            // 排队阶段的错误让整代事务以同一个原因失败
            let first_err = first.await.unwrap_err();
            assert!(matches!(
                first_err,
                RedisError::TransactionAborted(ref cause)
                    if matches!(**cause, RedisError::Server { ref code, .. } if code == "ERR")
            ));
            assert!(matches!(
                second.await,
                Err(RedisError::TransactionAborted(_))
            ));
            assert!(matches!(
                exec.await,
                Err(RedisError::TransactionAborted(_))
            ));

            assert!(!conn.is_closed());
            assert_eq!(conn.ping().await?, "PONG");
            Ok(())
        })
        .await
}

#[tokio::test]
async fn test_discard_fails_queued_commands() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let server = StubServer::start(vec![
                Step::ExpectCommands(1),
                Step::write(b"+OK\r\n"),
                Step::ExpectCommands(2),
                Step::write(b"+QUEUED\r\n+OK\r\n"),
                Step::ExpectCommands(1),
                Step::write(b"+PONG\r\n"),
            ])
            .await?;
            let client = client_for(&server);
            let conn = client.get_connection().await?;

            conn.multi().await?;
            let set = conn.set("k", "v", &[]);
            conn.discard().await?;

            assert!(matches!(set.await, Err(RedisError::TransactionDiscarded)));
            assert!(!conn.in_transaction());
            assert_eq!(conn.ping().await?, "PONG");
            Ok(())
        })
        .await
}

#[tokio::test]
async fn test_exec_framing_mismatch_closes_connection() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let server = StubServer::start(vec![
                Step::ExpectCommands(1),
                Step::write(b"+OK\r\n"),
                Step::ExpectCommands(3),
                // 排了两条命令，EXEC 却只带回一个结果
                Step::write(b"+QUEUED\r\n+QUEUED\r\n*1\r\n+OK\r\n"),
            ])
            .await?;
            let client = client_for(&server);
            let conn = client.get_connection().await?;

            conn.multi().await?;
            let first = conn.set("k", "1", &[]);
            let second = conn.incr("k");
            let exec = conn.exec();

            assert!(matches!(
                first.await,
                Err(RedisError::FramingMismatch { expected: 2, received: 1 })
            ));
            assert!(matches!(
                second.await,
                Err(RedisError::FramingMismatch { .. })
            ));
            assert!(matches!(exec.await, Err(RedisError::FramingMismatch { .. })));

            // 状态机已经失去配对能力，连接必须关闭
            assert!(conn.is_closed());
            Ok(())
        })
        .await
}

#[tokio::test]
async fn test_quit_aborts_open_transaction() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let server = StubServer::start(vec![
                Step::ExpectCommands(1),
                Step::write(b"+OK\r\n"),
                Step::ExpectCommands(2),
                Step::write(b"+QUEUED\r\n+OK\r\n"),
            ])
            .await?;
            let client = client_for(&server);
            let conn = client.get_connection().await?;

            conn.multi().await?;
            let set = conn.set("k", "v", &[]);
            conn.quit().await?;

            assert!(matches!(set.await, Err(RedisError::QuitCalled)));
            assert!(conn.is_closed());
            Ok(())
        })
        .await
}

#[tokio::test]
async fn test_watch_and_unwatch() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let server = StubServer::start(vec![
                Step::ExpectCommands(2),
                Step::write(b"+OK\r\n+OK\r\n"),
            ])
            .await?;
            let client = client_for(&server);
            let conn = client.get_connection().await?;

            let watch = conn.watch(&["k1", "k2"]);
            let unwatch = conn.unwatch();
            watch.await?;
            unwatch.await?;

            let inbound = server.finish().await?;
            assert_eq!(command_words(&inbound[0]), vec!["WATCH", "k1", "k2"]);
            assert_eq!(command_words(&inbound[1]), vec!["UNWATCH"]);
            Ok(())
        })
        .await
}

#[tokio::test]
async fn test_transaction_misuse_is_rejected() -> Result<()> {
    LocalSet::new()
        .run_until(async {
            let server = StubServer::start(vec![
                Step::ExpectCommands(1),
                Step::write(b"+OK\r\n"),
            ])
            .await?;
            let client = client_for(&server);
            let conn = client.get_connection().await?;

            assert!(matches!(
                conn.exec().await,
                Err(RedisError::TransactionMisuse(_))
            ));
            assert!(matches!(
                conn.discard().await,
                Err(RedisError::TransactionMisuse(_))
            ));

            conn.multi().await?;
            assert!(matches!(
                conn.multi().await,
                Err(RedisError::TransactionMisuse(_))
            ));
            Ok(())
        })
        .await
}
