//! Scripted device used by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use route_checker::error::TransportError;
use route_checker::{
    Connector, PlatformDefinition, SessionManager, SessionOptions, Shell, Target,
};

pub const PASSWORD: &str = "pw-Sup3r-s3cret";

pub enum Reply {
    Data(&'static str),
    Silence,
}

pub struct FakeShell {
    replies: VecDeque<Reply>,
    closed: Arc<Mutex<usize>>,
}

impl Shell for FakeShell {
    async fn send(&mut self, _input: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn send_raw(&mut self, _input: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn read_chunk(&mut self, wait: Duration) -> Result<Option<Vec<u8>>, TransportError> {
        match self.replies.pop_front() {
            Some(Reply::Data(text)) => Ok(Some(text.as_bytes().to_vec())),
            Some(Reply::Silence) => Ok(None),
            None => {
                tokio::time::sleep(wait).await;
                Ok(None)
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        *self.closed.lock().unwrap() += 1;
        Ok(())
    }
}

/// Hands out one shell replaying `replies`, or fails to connect.
pub struct FakeDevice {
    replies: Mutex<Option<Vec<Reply>>>,
    connect_error: Mutex<Option<TransportError>>,
    pub closed: Arc<Mutex<usize>>,
}

impl FakeDevice {
    /// A device that logs in and then prints `output` for the command.
    pub fn answering(output: &'static str) -> Self {
        let mut replies = login();
        replies.push(Reply::Data("show ip route\r\n"));
        replies.push(Reply::Data(output));
        replies.push(Reply::Data("\r\nrouter#"));
        replies.push(Reply::Silence);
        Self::scripted(replies)
    }

    pub fn scripted(replies: Vec<Reply>) -> Self {
        Self {
            replies: Mutex::new(Some(replies)),
            connect_error: Mutex::new(None),
            closed: Arc::new(Mutex::new(0)),
        }
    }

    pub fn unreachable(error: TransportError) -> Self {
        let device = Self::scripted(vec![]);
        *device.connect_error.lock().unwrap() = Some(error);
        device
    }

    pub fn closes(&self) -> usize {
        *self.closed.lock().unwrap()
    }
}

impl Connector for FakeDevice {
    type Shell = FakeShell;

    async fn connect(
        &self,
        _target: &Target,
        _platform: &PlatformDefinition,
    ) -> Result<FakeShell, TransportError> {
        if let Some(error) = self.connect_error.lock().unwrap().take() {
            return Err(error);
        }
        let replies = self.replies.lock().unwrap().take().unwrap_or_default();
        Ok(FakeShell {
            replies: replies.into(),
            closed: self.closed.clone(),
        })
    }
}

/// Prompt, then the replies to the two preparation commands.
pub fn login() -> Vec<Reply> {
    vec![
        Reply::Data("\r\nrouter#"),
        Reply::Data("terminal width 511\r\nrouter#"),
        Reply::Data("terminal length 0\r\nrouter#"),
    ]
}

pub fn fast_options() -> SessionOptions {
    SessionOptions {
        settle: Duration::from_millis(20),
        read_timeout: Duration::from_millis(500),
        ..SessionOptions::default()
    }
}

pub fn target() -> Target {
    Target::new("10.1.1.1", "admin", PASSWORD).with_timeout(Duration::from_millis(500))
}

pub fn sessions(device: FakeDevice) -> SessionManager<FakeDevice> {
    SessionManager::new(device, fast_options())
}
