// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test infrastructure: a scriptable fake [`BrowserDriver`] and
//! builders, so scenario and unit tests can drive deterministic sessions
//! without a real browser.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::account::Cookie;
use crate::driver::{BoxFuture, BrowserDriver};
use crate::error::OrchestratorError;
use crate::frame::Frame;
use crate::ocr::{BoxFuture as OcrBoxFuture, OcrClient, OcrResult};
use crate::script::{Point, Roi};

/// A [`BrowserDriver`] whose responses are entirely scripted by the test.
///
/// `frames` is consulted by `capture_screen`: each call pops the front
/// element, repeating the last one once the queue is drained so a test can
/// prime "match forever" by pushing a single frame.
pub struct FakeBrowserDriver {
    pub running: AtomicBool,
    pub screencasting: AtomicBool,
    pub click_count: Arc<AtomicU32>,
    frames: Mutex<VecDeque<Frame>>,
    pub fail_login: bool,
    pub fail_start: bool,
    pub login_delay: Duration,
    pub cookies: Mutex<Vec<Cookie>>,
}

impl FakeBrowserDriver {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(false),
            screencasting: AtomicBool::new(false),
            click_count: Arc::new(AtomicU32::new(0)),
            frames: Mutex::new(VecDeque::new()),
            fail_login: false,
            fail_start: false,
            login_delay: Duration::ZERO,
            cookies: Mutex::new(Vec::new()),
        }
    }

    pub fn with_frame(self, frame: Frame) -> Self {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).push_back(frame);
        self
    }

    pub fn with_fail_login(mut self) -> Self {
        self.fail_login = true;
        self
    }

    pub fn with_fail_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Hold `login_with_password`/`login_with_cookies` open for `delay`
    /// before resolving, so a test can observe the session mid-`LoggingIn`.
    pub fn with_login_delay(mut self, delay: Duration) -> Self {
        self.login_delay = delay;
        self
    }

    pub fn clicks(&self) -> u32 {
        self.click_count.load(Ordering::SeqCst)
    }

    /// A cloneable handle onto the click counter, taken before the driver is
    /// boxed and handed off to a session, so a test can still observe it.
    pub fn click_counter(&self) -> Arc<AtomicU32> {
        self.click_count.clone()
    }

    fn next_frame(&self) -> Frame {
        let mut frames = self.frames.lock().unwrap_or_else(|e| e.into_inner());
        match frames.pop_front() {
            Some(frame) => {
                frames.push_back(frame.clone());
                frame
            }
            None => Frame::new(1, 1, vec![0, 0, 0, 255]),
        }
    }
}

impl Default for FakeBrowserDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserDriver for FakeBrowserDriver {
    fn start(&mut self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            if self.fail_start {
                anyhow::bail!("driver start failed");
            }
            self.running.store(true, Ordering::SeqCst);
            Ok(())
        })
    }

    fn stop(&mut self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            self.running.store(false, Ordering::SeqCst);
            Ok(())
        })
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn navigate(&mut self, _url: String) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn reload(&mut self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn click(&mut self, _x: i32, _y: i32) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            self.click_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn drag(&mut self, _from: Point, _to: Point) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn drag_path(&mut self, _points: Vec<Point>) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn capture_screen(&mut self) -> BoxFuture<'_, anyhow::Result<Frame>> {
        Box::pin(async move { Ok(self.next_frame()) })
    }

    fn set_viewport(&mut self, _width: u32, _height: u32) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn wait_visible(&mut self, _selector: String) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn send_keys(&mut self, _selector: String, _text: String) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn click_element(&mut self, _selector: String) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn get_cookies(&mut self) -> BoxFuture<'_, anyhow::Result<Vec<Cookie>>> {
        Box::pin(async move { Ok(self.cookies.lock().unwrap_or_else(|e| e.into_inner()).clone()) })
    }

    fn set_cookies(&mut self, cookies: Vec<Cookie>) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            *self.cookies.lock().unwrap_or_else(|e| e.into_inner()) = cookies;
            Ok(())
        })
    }

    fn login_with_password(
        &mut self,
        _url: String,
        _user: String,
        _password: String,
        _timeout: Duration,
    ) -> BoxFuture<'_, anyhow::Result<()>> {
        let delay = self.login_delay;
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if self.fail_login {
                anyhow::bail!("login failed");
            }
            Ok(())
        })
    }

    fn login_with_cookies(
        &mut self,
        _url: String,
        _cookies: Vec<Cookie>,
        _timeout: Duration,
    ) -> BoxFuture<'_, anyhow::Result<()>> {
        let delay = self.login_delay;
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if self.fail_login {
                anyhow::bail!("login failed");
            }
            Ok(())
        })
    }

    fn start_screencast(
        &mut self,
        _quality: u8,
        _max_fps: u32,
    ) -> BoxFuture<'_, anyhow::Result<mpsc::Receiver<Frame>>> {
        Box::pin(async move {
            self.screencasting.store(true, Ordering::SeqCst);
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        })
    }

    fn stop_screencast(&mut self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            self.screencasting.store(false, Ordering::SeqCst);
            Ok(())
        })
    }

    fn is_screencasting(&self) -> bool {
        self.screencasting.load(Ordering::SeqCst)
    }
}

/// Build a `DriverFactory` that always returns a fresh default fake driver.
pub fn fake_driver_factory() -> crate::driver::DriverFactory {
    Arc::new(|| Box::new(FakeBrowserDriver::new()) as Box<dyn BrowserDriver>)
}

/// An [`OcrClient`] that always returns the same fixed ratio, so a test can
/// drive the OCR-gated quit condition deterministically.
pub struct FakeOcrClient {
    pub numerator: i64,
    pub denominator: i64,
}

impl FakeOcrClient {
    pub fn new(numerator: i64, denominator: i64) -> Self {
        Self { numerator, denominator }
    }
}

impl OcrClient for FakeOcrClient {
    fn recognize_usage_ratio(
        &self,
        _frame: &Frame,
        _roi: Option<Roi>,
    ) -> OcrBoxFuture<'_, Result<OcrResult, OrchestratorError>> {
        Box::pin(async move {
            Ok(OcrResult {
                numerator: self.numerator,
                denominator: self.denominator,
                raw_text: format!("{}/{}", self.numerator, self.denominator),
                confidence: 1.0,
                elapsed_ms: 0,
            })
        })
    }

    fn is_healthy(&self) -> bool {
        true
    }
}
