use crate::{dom::ScrollMetrics,
            error::{PickerError, Result},
            harvest::ScrollSurface};
use headless_chrome::Tab;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Scroll container inside a live tab, addressed by CSS selector (or the
/// document's scrolling element when there is none)
pub struct TabScrollSurface {
    tab: Arc<Tab>,
    selector: Option<String>,
}

impl TabScrollSurface {
    pub fn new(tab: Arc<Tab>, selector: Option<String>) -> Self {
        Self { tab, selector }
    }

    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    /// JS expression for the scrolled element; `null` when the selector matches nothing
    fn target_expr(&self) -> String {
        match &self.selector {
            // A JSON string literal is a valid JS string literal
            Some(selector) => format!(
                "document.querySelector({})",
                serde_json::Value::String(selector.clone())
            ),
            None => "(document.scrollingElement || document.documentElement)".to_string(),
        }
    }

    /// Evaluate `body` with `el` bound to the target and parse its JSON result
    fn eval_json<T: DeserializeOwned>(&self, body: &str) -> Result<T> {
        let script = format!(
            "(function() {{ const el = {}; if (!el) return JSON.stringify(null); {} }})()",
            self.target_expr(),
            body
        );
        let remote = self
            .tab
            .evaluate(&script, false)
            .map_err(|e| PickerError::EvaluationFailed(e.to_string()))?;

        let raw = remote
            .value
            .as_ref()
            .and_then(|v| v.as_str())
            .ok_or_else(|| PickerError::EvaluationFailed("Script returned no value".to_string()))?;
        Ok(serde_json::from_str(raw)?)
    }

    fn missing(&self) -> PickerError {
        PickerError::ElementNotFound(self.selector.clone().unwrap_or_else(|| "document".to_string()))
    }
}

impl ScrollSurface for TabScrollSurface {
    fn metrics(&mut self) -> Result<ScrollMetrics> {
        let metrics: Option<ScrollMetrics> = self.eval_json(
            "return JSON.stringify({ scrollTop: el.scrollTop, scrollLeft: el.scrollLeft, \
             scrollHeight: el.scrollHeight, scrollWidth: el.scrollWidth, \
             clientHeight: el.clientHeight, clientWidth: el.clientWidth });",
        )?;
        metrics.ok_or_else(|| self.missing())
    }

    fn scroll_to(&mut self, top: f64) -> Result<()> {
        let applied: Option<bool> = self.eval_json(&format!("el.scrollTop = {}; return JSON.stringify(true);", top))?;
        applied.map(|_| ()).ok_or_else(|| self.missing())
    }

    fn scroll_by(&mut self, delta: f64) -> Result<()> {
        let applied: Option<bool> =
            self.eval_json(&format!("el.scrollBy(0, {}); return JSON.stringify(true);", delta))?;
        applied.map(|_| ()).ok_or_else(|| self.missing())
    }

    fn rendered_text(&mut self) -> Result<String> {
        let text: Option<String> = self.eval_json(
            "const node = el === document.scrollingElement ? document.body : el; \
             return JSON.stringify(node ? node.innerText : '');",
        )?;
        text.ok_or_else(|| self.missing())
    }
}
