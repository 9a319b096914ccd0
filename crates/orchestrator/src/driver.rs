// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! BrowserDriver port (spec §4.5): the minimal capability set the script
//! runner and session actor need from a headless-browser instance.
//!
//! Modeled as an object-safe trait returning boxed futures, the same shape
//! the teacher uses for its `Detector` trait — it lets `Coordinator` hold a
//! `Box<dyn BrowserDriver>` per session without committing to `async_trait`.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::account::Cookie;
use crate::frame::Frame;
use crate::script::Point;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// All methods are synchronous-per-call and must only ever be invoked from
/// the owning session's command loop; concurrency safety across sessions
/// comes from *not sharing* driver instances (spec §4.5).
pub trait BrowserDriver: Send + Sync {
    fn start(&mut self) -> BoxFuture<'_, anyhow::Result<()>>;
    fn stop(&mut self) -> BoxFuture<'_, anyhow::Result<()>>;
    fn is_running(&self) -> bool;

    fn navigate(&mut self, url: String) -> BoxFuture<'_, anyhow::Result<()>>;
    fn reload(&mut self) -> BoxFuture<'_, anyhow::Result<()>>;

    fn click(&mut self, x: i32, y: i32) -> BoxFuture<'_, anyhow::Result<()>>;
    fn drag(&mut self, from: Point, to: Point) -> BoxFuture<'_, anyhow::Result<()>>;
    fn drag_path(&mut self, points: Vec<Point>) -> BoxFuture<'_, anyhow::Result<()>>;

    fn capture_screen(&mut self) -> BoxFuture<'_, anyhow::Result<Frame>>;
    fn set_viewport(&mut self, width: u32, height: u32) -> BoxFuture<'_, anyhow::Result<()>>;

    fn wait_visible(&mut self, selector: String) -> BoxFuture<'_, anyhow::Result<()>>;
    fn send_keys(&mut self, selector: String, text: String) -> BoxFuture<'_, anyhow::Result<()>>;
    fn click_element(&mut self, selector: String) -> BoxFuture<'_, anyhow::Result<()>>;

    fn get_cookies(&mut self) -> BoxFuture<'_, anyhow::Result<Vec<Cookie>>>;
    fn set_cookies(&mut self, cookies: Vec<Cookie>) -> BoxFuture<'_, anyhow::Result<()>>;

    fn login_with_password(
        &mut self,
        url: String,
        user: String,
        password: String,
        timeout: Duration,
    ) -> BoxFuture<'_, anyhow::Result<()>>;

    fn login_with_cookies(
        &mut self,
        url: String,
        cookies: Vec<Cookie>,
        timeout: Duration,
    ) -> BoxFuture<'_, anyhow::Result<()>>;

    fn start_screencast(
        &mut self,
        quality: u8,
        max_fps: u32,
    ) -> BoxFuture<'_, anyhow::Result<tokio::sync::mpsc::Receiver<Frame>>>;
    fn stop_screencast(&mut self) -> BoxFuture<'_, anyhow::Result<()>>;
    fn is_screencasting(&self) -> bool;
}

/// Factory for building a fresh driver per session. The coordinator holds
/// one of these and calls it once per `StartSession`.
pub type DriverFactory = std::sync::Arc<dyn Fn() -> Box<dyn BrowserDriver> + Send + Sync>;

/// No-op `BrowserDriver` for environments without a real browser backend
/// wired in (spec non-goal: "does not implement its own browser"). `start`
/// and login always succeed; captures return a blank single pixel frame.
/// Mirrors [`crate::ocr::NullOcrClient`]'s role as the default, not an
/// Open Question left unresolved.
#[derive(Debug, Default)]
pub struct NullBrowserDriver {
    running: bool,
    screencasting: bool,
}

impl NullBrowserDriver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BrowserDriver for NullBrowserDriver {
    fn start(&mut self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            self.running = true;
            Ok(())
        })
    }

    fn stop(&mut self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            self.running = false;
            Ok(())
        })
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn navigate(&mut self, _url: String) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn reload(&mut self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn click(&mut self, _x: i32, _y: i32) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn drag(&mut self, _from: Point, _to: Point) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn drag_path(&mut self, _points: Vec<Point>) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn capture_screen(&mut self) -> BoxFuture<'_, anyhow::Result<Frame>> {
        Box::pin(async move { Ok(Frame::new(1, 1, vec![0, 0, 0, 255])) })
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
        Box::pin(async move { Ok(Vec::new()) })
    }

    fn set_cookies(&mut self, _cookies: Vec<Cookie>) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn login_with_password(
        &mut self,
        _url: String,
        _user: String,
        _password: String,
        _timeout: Duration,
    ) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn login_with_cookies(
        &mut self,
        _url: String,
        _cookies: Vec<Cookie>,
        _timeout: Duration,
    ) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move { Ok(()) })
    }

    fn start_screencast(
        &mut self,
        _quality: u8,
        _max_fps: u32,
    ) -> BoxFuture<'_, anyhow::Result<tokio::sync::mpsc::Receiver<Frame>>> {
        Box::pin(async move {
            self.screencasting = true;
            let (_tx, rx) = tokio::sync::mpsc::channel(1);
            Ok(rx)
        })
    }

    fn stop_screencast(&mut self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            self.screencasting = false;
            Ok(())
        })
    }

    fn is_screencasting(&self) -> bool {
        self.screencasting
    }
}

/// Build a [`DriverFactory`] that always returns a fresh [`NullBrowserDriver`].
pub fn null_driver_factory() -> DriverFactory {
    std::sync::Arc::new(|| Box::new(NullBrowserDriver::new()) as Box<dyn BrowserDriver>)
}
