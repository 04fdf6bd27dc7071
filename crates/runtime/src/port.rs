//! Free-port discovery for the HTTP transport.

use crate::error::PortError;
use std::future::Future;
use std::io;

pub const DEFAULT_MAX_ATTEMPTS: u16 = 100;

async fn try_bind(host: &str, port: u16) -> io::Result<()> {
    // Dropped right away; the caller binds again for real.
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    drop(listener);
    Ok(())
}

/// First bindable port at or above `start`, trying at most [`DEFAULT_MAX_ATTEMPTS`] ports.
pub async fn find_available(start: u16, host: &str) -> Result<u16, PortError> {
    find_available_with(start, host, DEFAULT_MAX_ATTEMPTS, |port| {
        let host = host.to_string();
        async move { try_bind(&host, port).await }
    })
    .await
}

/// Sequential scan with a caller-supplied bind attempt.
///
/// `AddrInUse` moves on to the next port; any other error stops the scan.
pub async fn find_available_with<P, Fut>(
    start: u16,
    host: &str,
    max_attempts: u16,
    mut try_port: P,
) -> Result<u16, PortError>
where
    P: FnMut(u16) -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    let exhausted = |attempts: u16| PortError::Exhausted {
        host: host.to_string(),
        start,
        end: u32::from(start) + u32::from(attempts),
        attempts,
    };

    let mut port = start;
    for attempt in 0..max_attempts {
        match try_port(port).await {
            Ok(()) => return Ok(port),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                let Some(next) = port.checked_add(1) else {
                    return Err(exhausted(attempt + 1));
                };
                tracing::warn!(port, next, host = %host, "port is in use, trying the next one");
                port = next;
            }
            Err(source) => {
                return Err(PortError::Bind {
                    host: host.to_string(),
                    port,
                    source,
                });
            }
        }
    }
    Err(exhausted(max_attempts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn in_use() -> io::Error {
        io::Error::from(io::ErrorKind::AddrInUse)
    }

    #[tokio::test]
    async fn skips_a_busy_port() {
        let tried = RefCell::new(Vec::new());
        let port = find_available_with(3001, "127.0.0.1", 100, |p| {
            tried.borrow_mut().push(p);
            async move { if p == 3001 { Err(in_use()) } else { Ok(()) } }
        })
        .await
        .expect("port");
        assert_eq!(port, 3002);
        assert_eq!(*tried.borrow(), vec![3001, 3002]);
    }

    #[tokio::test]
    async fn other_bind_errors_are_not_retried() {
        let tried = RefCell::new(0);
        let err = find_available_with(80, "127.0.0.1", 100, |_| {
            *tried.borrow_mut() += 1;
            async { Err(io::Error::from(io::ErrorKind::PermissionDenied)) }
        })
        .await
        .expect_err("fatal");
        assert_eq!(*tried.borrow(), 1);
        assert!(matches!(err, PortError::Bind { port: 80, .. }));
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let err = find_available_with(4000, "127.0.0.1", 5, |_| async { Err(in_use()) })
            .await
            .expect_err("exhausted");
        match err {
            PortError::Exhausted {
                start,
                end,
                attempts,
                ..
            } => {
                assert_eq!((start, end, attempts), (4000, 4005, 5));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn stops_at_the_top_of_the_port_range() {
        let err = find_available_with(65_534, "127.0.0.1", 100, |_| async { Err(in_use()) })
            .await
            .expect_err("exhausted");
        assert!(matches!(err, PortError::Exhausted { attempts: 2, .. }));
    }

    #[tokio::test]
    async fn real_bind_skips_a_bound_listener() -> anyhow::Result<()> {
        let held = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let busy = held.local_addr()?.port();
        let port = find_available(busy, "127.0.0.1").await?;
        assert_ne!(port, busy);
        assert!(port > busy);
        Ok(())
    }
}
