//! Scroll harvesting
//!
//! Drives a scrollable region to its end so lazily loaded content materializes,
//! then hands back the cleaned text. Termination is growth-aware: reaching the
//! bottom once is not enough, the content extent has to stay put for
//! [`NO_GROWTH_LIMIT`] consecutive ticks at the bottom.
//!
//! - [`HarvestSession`]: the per-tick state machine
//! - [`scroll_and_settle`] / [`scroll_and_settle_blocking`]: timer-driven drivers
//! - [`ScrollSurface`]: what gets scrolled (a document node or a live tab)
//! - [`clean_text`]: final text normalization

pub mod text;

pub use text::clean_text;

use crate::dom::{DomTree, ScrollMetrics};
use crate::error::{PickerError, Result};
use crate::geometry::ScrollTarget;
use crate::input::Key;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Pixels from the end that still count as "at the bottom"
pub const BOTTOM_TOLERANCE: f64 = 10.0;

/// Consecutive unchanged-extent ticks at the bottom before the content counts as exhausted
pub const NO_GROWTH_LIMIT: u32 = 3;

/// Harvest timing and step size, as supplied by the settings store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HarvestOptions {
    /// Vertical pixels scrolled per tick
    pub step_distance: f64,
    /// Tick period
    pub interval_ms: u64,
    /// Overall budget; the run stops once this much time has elapsed
    pub max_duration_ms: u64,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            step_distance: 600.0,
            interval_ms: 200,
            max_duration_ms: 15_000,
        }
    }
}

impl HarvestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the scroll step
    pub fn step_distance(mut self, pixels: f64) -> Self {
        self.step_distance = pixels;
        self
    }

    /// Builder method: set the tick period
    pub fn interval_ms(mut self, millis: u64) -> Self {
        self.interval_ms = millis;
        self
    }

    /// Builder method: set the time budget
    pub fn max_duration_ms(mut self, millis: u64) -> Self {
        self.max_duration_ms = millis;
        self
    }

    pub fn interval(&self) -> Duration {
        // A zero period would make tokio's interval panic
        Duration::from_millis(self.interval_ms.max(1))
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }
}

/// Something that can be scrolled vertically and read back as text
pub trait ScrollSurface {
    /// Current scroll position and extents
    fn metrics(&mut self) -> Result<ScrollMetrics>;

    /// Jump to an absolute vertical position
    fn scroll_to(&mut self, top: f64) -> Result<()>;

    /// Move by a relative vertical offset
    fn scroll_by(&mut self, delta: f64) -> Result<()> {
        let current = self.metrics()?.scroll_top;
        self.scroll_to(current + delta)
    }

    /// Rendered text of the surface's content
    fn rendered_text(&mut self) -> Result<String>;
}

/// A scroll target inside a [`DomTree`]. A stale target reads as empty and
/// ignores scrolling, so a harvest over it simply settles.
pub struct DocumentSurface<'a> {
    tree: &'a mut DomTree,
    target: ScrollTarget,
}

impl<'a> DocumentSurface<'a> {
    pub fn new(tree: &'a mut DomTree, target: ScrollTarget) -> Self {
        Self { tree, target }
    }

    pub fn tree(&self) -> &DomTree {
        &*self.tree
    }
}

impl ScrollSurface for DocumentSurface<'_> {
    fn metrics(&mut self) -> Result<ScrollMetrics> {
        let node = self.target.node(&*self.tree);
        Ok(self.tree.get(node).map(|e| e.scroll).unwrap_or_default())
    }

    fn scroll_to(&mut self, top: f64) -> Result<()> {
        let node = self.target.node(&*self.tree);
        self.tree.set_scroll_top(node, top);
        Ok(())
    }

    fn rendered_text(&mut self) -> Result<String> {
        let node = match self.target {
            ScrollTarget::Document => self.tree.body(),
            ScrollTarget::Node(id) => id,
        };
        Ok(self.tree.inner_text(node))
    }
}

/// Why a harvest stopped. None of these are failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HarvestEnd {
    /// Content stopped growing at the bottom
    Exhausted,
    /// The time budget ran out
    TimedOut,
    /// The user cancelled
    Cancelled,
    /// The scrolled element went away mid-run
    Detached,
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Keep going; carries the coverage percentage after this tick
    Continue(f64),
    Finished(HarvestEnd),
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestReport {
    pub end: HarvestEnd,
    /// Scroll steps performed
    pub ticks: u32,
    /// Last reported coverage, 0–100
    pub coverage_percent: f64,
    /// Final content extent
    pub content_extent: f64,
}

/// State of one scroll-and-collect run
#[derive(Debug)]
pub struct HarvestSession {
    options: HarvestOptions,
    cancel: CancellationToken,
    start_position: f64,
    last_extent: f64,
    no_growth: u32,
    ticks: u32,
    coverage: f64,
    end: Option<HarvestEnd>,
}

impl HarvestSession {
    /// Start a run, remembering where the surface was so it can be put back
    pub fn begin<S: ScrollSurface + ?Sized>(
        surface: &mut S,
        options: HarvestOptions,
        cancel: CancellationToken,
    ) -> Result<Self> {
        let metrics = surface.metrics()?;
        log::info!(
            "Harvest started at {:.0}px of {:.0}px (step {:.0}px, every {}ms, budget {}ms)",
            metrics.scroll_top,
            metrics.scroll_height,
            options.step_distance,
            options.interval_ms,
            options.max_duration_ms
        );
        Ok(Self {
            options,
            cancel,
            start_position: metrics.scroll_top,
            last_extent: metrics.scroll_height,
            no_growth: 0,
            ticks: 0,
            coverage: coverage_percent(&metrics),
            end: None,
        })
    }

    /// Run one timer tick. `elapsed` is measured from the start of the run.
    pub fn tick<S: ScrollSurface + ?Sized>(&mut self, surface: &mut S, elapsed: Duration) -> Result<TickOutcome> {
        if let Some(end) = self.end {
            return Ok(TickOutcome::Finished(end));
        }

        if self.cancel.is_cancelled() {
            return self.finish(surface, HarvestEnd::Cancelled);
        }
        if elapsed >= self.options.max_duration() {
            return self.finish(surface, HarvestEnd::TimedOut);
        }

        let metrics = match surface.scroll_by(self.options.step_distance).and_then(|_| surface.metrics()) {
            Ok(metrics) => metrics,
            Err(PickerError::ElementNotFound(what)) => {
                log::debug!("Harvest target {} detached", what);
                return self.finish(surface, HarvestEnd::Detached);
            }
            Err(e) => return Err(e),
        };
        self.ticks += 1;
        self.coverage = coverage_percent(&metrics);
        log::debug!("Harvest tick {}: {:.1}% covered", self.ticks, self.coverage);

        if metrics.at_bottom(BOTTOM_TOLERANCE) {
            if metrics.scroll_height == self.last_extent {
                self.no_growth += 1;
            } else {
                self.no_growth = 0;
            }
        } else {
            self.no_growth = 0;
        }
        self.last_extent = metrics.scroll_height;

        if self.no_growth >= NO_GROWTH_LIMIT {
            return self.finish(surface, HarvestEnd::Exhausted);
        }
        Ok(TickOutcome::Continue(self.coverage))
    }

    fn finish<S: ScrollSurface + ?Sized>(&mut self, surface: &mut S, end: HarvestEnd) -> Result<TickOutcome> {
        if let Err(e) = surface.scroll_to(self.start_position) {
            log::warn!("Could not restore scroll position {:.0}px: {}", self.start_position, e);
        }
        self.end = Some(end);
        log::info!("Harvest finished ({:?}) after {} ticks at {:.1}%", end, self.ticks, self.coverage);
        Ok(TickOutcome::Finished(end))
    }

    pub fn is_finished(&self) -> bool {
        self.end.is_some()
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn report(&self) -> Option<HarvestReport> {
        self.end.map(|end| HarvestReport {
            end,
            ticks: self.ticks,
            coverage_percent: self.coverage,
            content_extent: self.last_extent,
        })
    }
}

fn coverage_percent(metrics: &ScrollMetrics) -> f64 {
    if metrics.scroll_height <= 0.0 {
        return 100.0;
    }
    ((metrics.scroll_top + metrics.client_height) / metrics.scroll_height * 100.0).clamp(0.0, 100.0)
}

fn into_report(session: &HarvestSession) -> HarvestReport {
    session.report().unwrap_or(HarvestReport {
        end: HarvestEnd::Cancelled,
        ticks: session.ticks,
        coverage_percent: session.coverage,
        content_extent: session.last_extent,
    })
}

/// Scroll `surface` to its end on a fixed-period timer and resolve once the
/// run stops (exhausted, timed out or cancelled). The scroll position is back at
/// its starting point when this returns `Ok`.
pub async fn scroll_and_settle<S: ScrollSurface + ?Sized>(
    surface: &mut S,
    options: &HarvestOptions,
    cancel: CancellationToken,
) -> Result<HarvestReport> {
    let started = tokio::time::Instant::now();
    let mut session = HarvestSession::begin(surface, options.clone(), cancel)?;

    let mut interval = tokio::time::interval(options.interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;
        if let TickOutcome::Finished(_) = session.tick(surface, started.elapsed())? {
            break;
        }
    }

    Ok(into_report(&session))
}

/// Same as [`scroll_and_settle`] for callers without an async runtime; sleeps
/// the current thread between ticks.
pub fn scroll_and_settle_blocking<S: ScrollSurface + ?Sized>(
    surface: &mut S,
    options: &HarvestOptions,
    cancel: CancellationToken,
) -> Result<HarvestReport> {
    let started = std::time::Instant::now();
    let mut session = HarvestSession::begin(surface, options.clone(), cancel)?;

    loop {
        std::thread::sleep(options.interval());
        if let TickOutcome::Finished(_) = session.tick(surface, started.elapsed())? {
            break;
        }
    }

    Ok(into_report(&session))
}

/// Harvest a surface and return its cleaned text
pub async fn harvest_text<S: ScrollSurface + ?Sized>(
    surface: &mut S,
    options: &HarvestOptions,
    cancel: CancellationToken,
) -> Result<(HarvestReport, String)> {
    let report = scroll_and_settle(surface, options, cancel).await?;
    let text = clean_text(&surface.rendered_text()?);
    Ok((report, text))
}

/// Recognizes the harvest cancel key while a run is in flight, whatever the
/// picker is doing.
#[derive(Debug, Clone)]
pub struct HarvestCancelKey {
    key: Key,
    token: CancellationToken,
}

impl HarvestCancelKey {
    pub fn new(token: CancellationToken) -> Self {
        Self { key: Key::Escape, token }
    }

    /// Builder method: use a different cancel key
    pub fn with_key(mut self, key: Key) -> Self {
        self.key = key;
        self
    }

    /// Cancel the run if `key` is the cancel key; returns whether it was consumed
    pub fn handle_key(&self, key: Key) -> bool {
        if key != self.key || self.token.is_cancelled() {
            return false;
        }
        log::info!("Harvest cancelled by user");
        self.token.cancel();
        true
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}
