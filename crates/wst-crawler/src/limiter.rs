use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::{self, Instant};
use url::Url;

use crate::config::{CrawlerConfig, Throttle};
use crate::robots::origin;

/// Spaces out request starts by a fixed delay.
#[derive(Debug)]
pub struct DelayGate {
    delay: Duration,
    randomize: bool,
    next_start: Mutex<Instant>,
}

impl DelayGate {
    pub fn new(delay: Duration, randomize: bool) -> Self {
        Self {
            delay,
            randomize,
            next_start: Mutex::new(Instant::now()),
        }
    }

    fn spacing(&self) -> Duration {
        if self.randomize && !self.delay.is_zero() {
            self.delay.mul_f64(rand::thread_rng().gen_range(0.5..1.5))
        } else {
            self.delay
        }
    }

    /// Waits for this request's turn. `min_spacing` raises the gap left
    /// before the next request, e.g. for a robots.txt crawl delay.
    pub async fn wait(&self, min_spacing: Option<Duration>) {
        let spacing = match min_spacing {
            Some(min) => self.spacing().max(min),
            None => self.spacing(),
        };
        let start = {
            let mut next_start = self.next_start.lock().await;
            let start = (*next_start).max(Instant::now());
            *next_start = start + spacing;
            start
        };
        time::sleep_until(start).await;
    }
}

/// Hands out `per_second` permits every second.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    permits: Arc<Semaphore>,
}

impl RateLimiter {
    /// Must be called from within a tokio runtime, the refill task stops
    /// once every clone of the limiter is dropped.
    pub fn new(per_second: usize) -> Self {
        let permits = Arc::new(Semaphore::new(per_second));

        let refill = Arc::downgrade(&permits);
        tokio::spawn(async move {
            let mut ticks = time::interval(Duration::from_secs(1));
            ticks.tick().await;
            loop {
                ticks.tick().await;
                match refill.upgrade() {
                    Some(permits) => {
                        let available = permits.available_permits();
                        permits.add_permits(per_second.saturating_sub(available));
                    }
                    None => break,
                }
            }
        });

        Self { permits }
    }

    pub async fn acquire(&self) {
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
    }
}

/// Combines the configured throttling with per-site crawl delays.
///
/// The configured delay or rate applies to every request, a robots.txt
/// crawl delay only to the requests of its own origin.
#[derive(Debug)]
pub struct Throttler {
    gate: DelayGate,
    limiter: Option<RateLimiter>,
    sites: Mutex<HashMap<String, Arc<DelayGate>>>,
}

impl Throttler {
    pub fn new(config: &CrawlerConfig) -> Self {
        let (gate, limiter) = match config.throttle {
            Some(Throttle::Delay(secs)) => (
                DelayGate::new(Duration::from_secs_f32(secs), config.randomize_delay),
                None,
            ),
            Some(Throttle::PerSecond(n)) => (
                DelayGate::new(Duration::ZERO, false),
                Some(RateLimiter::new(n.get())),
            ),
            None => (DelayGate::new(Duration::ZERO, false), None),
        };
        Self {
            gate,
            limiter,
            sites: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until `url` may be requested, `crawl_delay` is the one its
    /// site asks for in robots.txt.
    pub async fn wait(&self, url: &Url, crawl_delay: Option<Duration>) {
        if let Some(limiter) = &self.limiter {
            limiter.acquire().await;
        }
        self.gate.wait(None).await;

        let (Some(delay), Some(key)) = (crawl_delay, origin(url)) else {
            return;
        };
        let site = self
            .sites
            .lock()
            .await
            .entry(key)
            .or_insert_with(|| Arc::new(DelayGate::new(delay, false)))
            .clone();
        site.wait(Some(delay)).await;
    }
}
