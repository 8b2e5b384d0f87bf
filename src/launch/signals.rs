//! Signal relay between the launcher and the frpc child
//!
//! SIGINT, SIGTERM and SIGHUP received by the launcher are forwarded to the
//! child. When the child dies from a signal the launcher re-raises that
//! signal on itself so callers observe the same cause of death.
//! On Windows the console delivers Ctrl+C to the child directly; the
//! launcher only absorbs it so it outlives the child.

use std::process::ExitStatus;

use futures::stream::{BoxStream, Stream, StreamExt};
use log::{debug, warn};
use tokio::process::Child;

use crate::error::{Error, Result};

/// How the child process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildExit {
    Code(i32),
    /// Terminated by the given signal number
    Signaled(i32),
    /// No code and no signal reported
    Unknown,
}

impl From<ExitStatus> for ChildExit {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ChildExit::Code(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signo) = status.signal() {
                return ChildExit::Signaled(signo);
            }
        }
        ChildExit::Unknown
    }
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
        use nix::unistd::Pid;
        use tokio::signal::unix::{signal as listen, SignalKind};
        use tokio_stream::wrappers::SignalStream;

        /// Signals delivered to the launcher, as signal numbers
        ///
        /// Installing the listeners replaces the default disposition, so this
        /// must run before the child is spawned.
        pub fn relay_stream() -> Result<BoxStream<'static, i32>> {
            let kinds = [
                (SignalKind::interrupt(), Signal::SIGINT),
                (SignalKind::terminate(), Signal::SIGTERM),
                (SignalKind::hangup(), Signal::SIGHUP),
            ];
            let mut streams = Vec::with_capacity(kinds.len());
            for (kind, sig) in kinds {
                let listener = listen(kind)
                    .map_err(|e| Error::io(format!("register {sig} handler"), e))?;
                streams.push(SignalStream::new(listener).map(move |()| sig as i32).boxed());
            }
            Ok(futures::stream::select_all(streams).boxed())
        }

        /// Send `signo` to the process `pid`
        pub fn forward(pid: u32, signo: i32) -> Result<()> {
            let sig = Signal::try_from(signo)
                .map_err(|e| Error::io(format!("signal {signo}"), e.into()))?;
            let pid = i32::try_from(pid)
                .map_err(|e| Error::io("child pid", std::io::Error::other(e)))?;
            signal::kill(Pid::from_raw(pid), sig)
                .map_err(|e| Error::io(format!("forward {sig} to {pid}"), e.into()))
        }

        /// Restore the default disposition of `signo` and raise it on ourselves
        fn reraise(signo: i32) {
            let Ok(sig) = Signal::try_from(signo) else {
                return;
            };
            let default = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
            // SAFETY: installs SIG_DFL, no handler code runs.
            if let Err(e) = unsafe { signal::sigaction(sig, &default) } {
                warn!("frpc: failed to reset {sig}: {e}");
            }
            if let Err(e) = signal::raise(sig) {
                warn!("frpc: failed to re-raise {sig}: {e}");
            }
        }
    } else {
        use tokio_stream::wrappers::CtrlCStream;

        const CTRL_C: i32 = 2;

        /// Ctrl+C events delivered to the launcher
        pub fn relay_stream() -> Result<BoxStream<'static, i32>> {
            let listener = tokio::signal::windows::ctrl_c()
                .map_err(|e| Error::io("register Ctrl+C handler", e))?;
            Ok(CtrlCStream::new(listener).map(|()| CTRL_C).boxed())
        }

        /// The console already delivered the event to the child
        pub fn forward(_pid: u32, _signo: i32) -> Result<()> {
            Ok(())
        }

        fn reraise(_signo: i32) {}
    }
}

/// Wait for `child`, relaying every signal from `signals` to it
pub async fn supervise<S>(child: &mut Child, mut signals: S) -> Result<ChildExit>
where
    S: Stream<Item = i32> + Unpin,
{
    loop {
        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|e| Error::io("wait for frpc", e))?;
                debug!("frpc exited: {status}");
                return Ok(ChildExit::from(status));
            }
            Some(signo) = signals.next() => {
                match child.id() {
                    Some(pid) => {
                        debug!("relaying signal {signo} to pid {pid}");
                        if let Err(e) = forward(pid, signo) {
                            warn!("frpc: {:#}", anyhow::Error::from(e));
                        }
                    }
                    None => debug!("signal {signo} after child exit, ignored"),
                }
            }
        }
    }
}

/// Terminate the current process the way the child terminated
pub fn exit_like(exit: ChildExit) -> ! {
    match exit {
        ChildExit::Code(code) => std::process::exit(code),
        ChildExit::Signaled(signo) => {
            reraise(signo);
            std::process::exit(1)
        }
        ChildExit::Unknown => std::process::exit(1),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::process::Stdio;
    use tokio::sync::mpsc;
    use tokio_stream::wrappers::UnboundedReceiverStream;

    fn sh(script: &str) -> Child {
        tokio::process::Command::new("/bin/sh")
            .arg("-c")
            .arg(script)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .unwrap()
    }

    #[tokio::test]
    async fn exit_code_is_reported() {
        let mut child = sh("exit 42");
        let exit = supervise(&mut child, futures::stream::pending())
            .await
            .unwrap();
        assert_eq!(exit, ChildExit::Code(42));
    }

    #[tokio::test]
    async fn relayed_interrupt_kills_child() {
        let mut child = sh("exec sleep 30");
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(Signal::SIGINT as i32).unwrap();

        let exit = supervise(&mut child, UnboundedReceiverStream::new(rx))
            .await
            .unwrap();
        assert_eq!(exit, ChildExit::Signaled(Signal::SIGINT as i32));
    }

    #[tokio::test]
    async fn forward_delivers_terminate() {
        let mut child = sh("exec sleep 30");
        forward(child.id().unwrap(), Signal::SIGTERM as i32).unwrap();
        let status = child.wait().await.unwrap();
        assert_eq!(ChildExit::from(status), ChildExit::Signaled(Signal::SIGTERM as i32));
    }

    #[test]
    fn invalid_signal_number_is_an_error() {
        assert!(forward(std::process::id(), 12345).is_err());
    }
}
