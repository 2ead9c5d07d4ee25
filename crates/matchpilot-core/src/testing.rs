//! In-memory remote pages for exercising the engine without a browser.
//!
//! A [`ScriptedPage`] holds a fake URL, body text, table cells and a set of
//! elements addressed by selector. Clicks and navigations trigger scripted
//! [`Reaction`]s; `evaluate` answers from scripted rules or, for the probes in
//! [`crate::scripts`], from the page state. Everything the engine does is
//! recorded for assertions.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use crate::remote::{
    DialogEvent, DialogResponse, DialogSender, DialogSubscription, ElementHandle, PageError,
    RemotePage, RemoteSession, WaitPolicy,
};

/// A scripted consequence of a click or navigation.
#[derive(Clone)]
pub enum Reaction {
    SetUrl(String),
    SetText(String),
    SetTitle(String),
    SetCells(Vec<String>),
    SetUploadLink(bool),
    SetRunLink(bool),
    AddElement(String),
    RemoveElement(String),
    /// Raise a modal dialog.
    Dialog(DialogEvent),
    /// Open a new view, as a `target=_blank` link would.
    OpenView(Arc<ScriptedPage>),
}

/// Scripted outcomes, one entry consumed per use; the last one repeats.
struct Script<T> {
    queue: VecDeque<T>,
}

impl<T: Clone> Script<T> {
    fn new(items: Vec<T>) -> Self {
        Self { queue: items.into() }
    }

    fn next(&mut self) -> Option<T> {
        if self.queue.len() > 1 {
            self.queue.pop_front()
        } else {
            self.queue.front().cloned()
        }
    }
}

#[derive(Default)]
struct PageState {
    url: String,
    title: String,
    text: String,
    cells: Vec<String>,
    has_upload_link: bool,
    has_run_link: bool,
    elements: Vec<(String, ElementHandle)>,
    evaluate_rules: Vec<(String, Script<Result<Value, PageError>>)>,
    click_rules: HashMap<String, Script<Vec<Reaction>>>,
    navigate_rules: Vec<(String, Vec<Reaction>)>,
    navigate_failures: Vec<(String, PageError)>,
    upload_failure: Option<PageError>,
    dialog_handler: Option<(DialogResponse, DialogSender)>,
    opened_views: Vec<Arc<ScriptedPage>>,

    clicks: Vec<String>,
    selected: Vec<String>,
    typed: Vec<(String, String)>,
    uploads: Vec<(String, PathBuf)>,
    navigations: Vec<String>,
    evaluations: Vec<String>,
    handled_dialogs: Vec<(DialogResponse, DialogEvent)>,
    unhandled_dialogs: Vec<DialogEvent>,
}

static NEXT_ELEMENT: AtomicUsize = AtomicUsize::new(1);

/// A fake browser view.
pub struct ScriptedPage {
    id: String,
    state: Mutex<PageState>,
}

impl ScriptedPage {
    pub fn new(id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            state: Mutex::new(PageState {
                url: "about:blank".to_string(),
                ..Default::default()
            }),
        })
    }

    /// A page already showing `url`.
    pub fn at(id: impl Into<String>, url: &str) -> Arc<Self> {
        let page = Self::new(id);
        page.set_url(url);
        page
    }

    pub fn set_url(&self, url: &str) {
        self.state.lock().url = url.to_string();
    }

    pub fn set_text(&self, text: &str) {
        self.state.lock().text = text.to_string();
    }

    pub fn set_cells(&self, cells: &[&str]) {
        self.state.lock().cells = cells.iter().map(|c| c.to_string()).collect();
    }

    pub fn set_links(&self, upload: bool, run: bool) {
        let mut state = self.state.lock();
        state.has_upload_link = upload;
        state.has_run_link = run;
    }

    pub fn add_element(&self, selector: &str) -> ElementHandle {
        let mut state = self.state.lock();
        add_element(&mut state, selector)
    }

    pub fn remove_element(&self, selector: &str) {
        self.state.lock().elements.retain(|(s, _)| s != selector);
    }

    /// Answer evaluations whose expression contains `needle`.
    pub fn on_evaluate(&self, needle: &str, values: Vec<Value>) {
        self.on_evaluate_results(needle, values.into_iter().map(Ok).collect());
    }

    /// Like [`ScriptedPage::on_evaluate`], with scripted failures. Replaces any
    /// earlier rule for the same needle.
    pub fn on_evaluate_results(&self, needle: &str, results: Vec<Result<Value, PageError>>) {
        let mut state = self.state.lock();
        state.evaluate_rules.retain(|(n, _)| n != needle);
        state
            .evaluate_rules
            .push((needle.to_string(), Script::new(results)));
    }

    /// Queue what successive clicks on `selector` do.
    pub fn on_click(&self, selector: &str, clicks: Vec<Vec<Reaction>>) {
        self.state
            .lock()
            .click_rules
            .insert(selector.to_string(), Script::new(clicks));
    }

    /// Apply `reactions` whenever a URL containing `needle` is loaded.
    pub fn on_navigate(&self, needle: &str, reactions: Vec<Reaction>) {
        self.state
            .lock()
            .navigate_rules
            .push((needle.to_string(), reactions));
    }

    pub fn fail_navigation(&self, needle: &str, error: PageError) {
        self.state
            .lock()
            .navigate_failures
            .push((needle.to_string(), error));
    }

    /// Every later `upload_file` call fails with `error`.
    pub fn fail_uploads(&self, error: PageError) {
        self.state.lock().upload_failure = Some(error);
    }

    pub fn url(&self) -> String {
        self.state.lock().url.clone()
    }

    pub fn text(&self) -> String {
        self.state.lock().text.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().clicks.clone()
    }

    pub fn click_count(&self, selector: &str) -> usize {
        self.state.lock().clicks.iter().filter(|s| *s == selector).count()
    }

    pub fn selected(&self) -> Vec<String> {
        self.state.lock().selected.clone()
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.state.lock().typed.clone()
    }

    pub fn uploads(&self) -> Vec<(String, PathBuf)> {
        self.state.lock().uploads.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().navigations.clone()
    }

    /// Evaluations whose expression contains `needle`.
    pub fn evaluation_count(&self, needle: &str) -> usize {
        self.state
            .lock()
            .evaluations
            .iter()
            .filter(|e| e.contains(needle))
            .count()
    }

    pub fn handled_dialogs(&self) -> Vec<(DialogResponse, DialogEvent)> {
        self.state.lock().handled_dialogs.clone()
    }

    pub fn unhandled_dialogs(&self) -> Vec<DialogEvent> {
        self.state.lock().unhandled_dialogs.clone()
    }

    fn take_opened_views(&self) -> Vec<Arc<ScriptedPage>> {
        std::mem::take(&mut self.state.lock().opened_views)
    }

    fn selector_of(state: &PageState, element: &ElementHandle) -> Result<String, PageError> {
        state
            .elements
            .iter()
            .find(|(_, h)| h == element)
            .map(|(s, _)| s.clone())
            .ok_or_else(|| PageError::ElementGone(format!("element {}", element.id())))
    }

    fn apply(state: &mut PageState, reactions: Vec<Reaction>) {
        for reaction in reactions {
            match reaction {
                Reaction::SetUrl(url) => state.url = url,
                Reaction::SetText(text) => state.text = text,
                Reaction::SetTitle(title) => state.title = title,
                Reaction::SetCells(cells) => state.cells = cells,
                Reaction::SetUploadLink(on) => state.has_upload_link = on,
                Reaction::SetRunLink(on) => state.has_run_link = on,
                Reaction::AddElement(selector) => {
                    add_element(state, &selector);
                }
                Reaction::RemoveElement(selector) => {
                    state.elements.retain(|(s, _)| *s != selector);
                }
                Reaction::Dialog(event) => match state.dialog_handler.take() {
                    Some((response, sender)) => {
                        state.handled_dialogs.push((response, event.clone()));
                        sender.deliver(event);
                    }
                    None => state.unhandled_dialogs.push(event),
                },
                Reaction::OpenView(page) => state.opened_views.push(page),
            }
        }
    }

    fn builtin_evaluate(state: &PageState, expression: &str) -> Value {
        if expression.contains("/* body-text */") {
            Value::String(state.text.clone())
        } else if expression.contains("/* page-snapshot */") {
            json!({
                "url": state.url,
                "title": state.title,
                "text": state.text,
                "hasUploadLink": state.has_upload_link,
                "hasRunLink": state.has_run_link,
            })
        } else if expression.contains("/* table-cells */") {
            json!(state.cells)
        } else if expression.contains("/* keepalive */") {
            json!(1)
        } else {
            Value::Null
        }
    }
}

fn add_element(state: &mut PageState, selector: &str) -> ElementHandle {
    let handle = ElementHandle::new(NEXT_ELEMENT.fetch_add(1, Ordering::Relaxed) as i64);
    state.elements.push((selector.to_string(), handle));
    handle
}

#[async_trait]
impl RemotePage for ScriptedPage {
    fn id(&self) -> &str {
        &self.id
    }

    async fn navigate(&self, url: &str, _wait: WaitPolicy, _timeout: Duration) -> Result<(), PageError> {
        let mut state = self.state.lock();
        state.navigations.push(url.to_string());
        if let Some((_, err)) = state
            .navigate_failures
            .iter()
            .find(|(needle, _)| url.contains(needle.as_str()))
        {
            return Err(err.clone());
        }
        state.url = url.to_string();
        let reactions: Vec<Reaction> = state
            .navigate_rules
            .iter()
            .filter(|(needle, _)| url.contains(needle.as_str()))
            .flat_map(|(_, r)| r.clone())
            .collect();
        Self::apply(&mut state, reactions);
        Ok(())
    }

    async fn current_url(&self) -> Result<String, PageError> {
        Ok(self.url())
    }

    async fn query(&self, selector: &str) -> Result<Option<ElementHandle>, PageError> {
        let state = self.state.lock();
        Ok(state
            .elements
            .iter()
            .find(|(s, _)| s == selector)
            .map(|(_, h)| *h))
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<ElementHandle>, PageError> {
        let state = self.state.lock();
        Ok(state
            .elements
            .iter()
            .filter(|(s, _)| s == selector)
            .map(|(_, h)| *h)
            .collect())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, PageError> {
        let mut state = self.state.lock();
        state.evaluations.push(expression.to_string());
        let scripted = state
            .evaluate_rules
            .iter_mut()
            .find(|(needle, _)| expression.contains(needle.as_str()))
            .and_then(|(_, script)| script.next());
        match scripted {
            Some(result) => result,
            None => Ok(Self::builtin_evaluate(&state, expression)),
        }
    }

    async fn click(&self, element: &ElementHandle) -> Result<(), PageError> {
        let mut state = self.state.lock();
        let selector = Self::selector_of(&state, element)?;
        state.clicks.push(selector.clone());
        let reactions = state
            .click_rules
            .get_mut(&selector)
            .and_then(|script| script.next())
            .unwrap_or_default();
        Self::apply(&mut state, reactions);
        Ok(())
    }

    async fn select_all(&self, element: &ElementHandle) -> Result<(), PageError> {
        let mut state = self.state.lock();
        let selector = Self::selector_of(&state, element)?;
        state.selected.push(selector);
        Ok(())
    }

    async fn type_text(&self, element: &ElementHandle, text: &str) -> Result<(), PageError> {
        let mut state = self.state.lock();
        let selector = Self::selector_of(&state, element)?;
        state.typed.push((selector, text.to_string()));
        Ok(())
    }

    async fn upload_file(&self, element: &ElementHandle, path: &Path) -> Result<(), PageError> {
        let mut state = self.state.lock();
        let selector = Self::selector_of(&state, element)?;
        if let Some(err) = &state.upload_failure {
            return Err(err.clone());
        }
        state.uploads.push((selector, path.to_path_buf()));
        Ok(())
    }

    async fn once_dialog(&self, response: DialogResponse) -> Result<DialogSubscription, PageError> {
        let (sender, subscription) = DialogSubscription::channel();
        self.state.lock().dialog_handler = Some((response, sender));
        Ok(subscription)
    }
}

/// A fake browser holding scripted pages.
#[derive(Default)]
pub struct ScriptedSession {
    pages: Mutex<Vec<Arc<ScriptedPage>>>,
    prepared: Mutex<VecDeque<Arc<ScriptedPage>>>,
    opened: AtomicUsize,
}

impl ScriptedSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Hand out `page` on the next `open_page` call.
    pub fn prepare(&self, page: Arc<ScriptedPage>) {
        self.prepared.lock().push_back(page);
    }

    /// Register a page as already open.
    pub fn attach(&self, page: Arc<ScriptedPage>) {
        self.pages.lock().push(page);
    }

    pub fn scripted_pages(&self) -> Vec<Arc<ScriptedPage>> {
        self.pages.lock().clone()
    }

    /// How many times `open_page` was called.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::Relaxed)
    }

    fn claim_opened_view(&self, matcher: &(dyn for<'m> Fn(&'m str) -> bool + Send + Sync)) -> Option<Arc<ScriptedPage>> {
        let known = self.pages.lock().clone();
        let mut found = None;
        for page in known {
            for view in page.take_opened_views() {
                if found.is_none() && matcher(&view.url()) {
                    found = Some(view);
                } else {
                    // Not what we are waiting for; keep it visible to the next waiter.
                    page.state.lock().opened_views.push(view);
                }
            }
        }
        if let Some(view) = &found {
            self.pages.lock().push(view.clone());
        }
        found
    }
}

#[async_trait]
impl RemoteSession for ScriptedSession {
    async fn open_page(&self, url: Option<&str>) -> Result<Arc<dyn RemotePage>, PageError> {
        let n = self.opened.fetch_add(1, Ordering::Relaxed);
        let page = self
            .prepared
            .lock()
            .pop_front()
            .unwrap_or_else(|| ScriptedPage::new(format!("page-{}", n)));
        self.pages.lock().push(page.clone());
        if let Some(url) = url {
            page.navigate(url, WaitPolicy::DomContentLoaded, Duration::from_secs(30))
                .await?;
        }
        Ok(page)
    }

    async fn wait_for_page(
        &self,
        matcher: &(dyn for<'m> Fn(&'m str) -> bool + Send + Sync),
        timeout: Duration,
    ) -> Result<Arc<dyn RemotePage>, PageError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(view) = self.claim_opened_view(matcher) {
                return Ok(view);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(PageError::Timeout(format!(
                    "no new view within {}ms",
                    timeout.as_millis()
                )));
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    async fn pages(&self) -> Vec<Arc<dyn RemotePage>> {
        self.pages
            .lock()
            .iter()
            .map(|p| p.clone() as Arc<dyn RemotePage>)
            .collect()
    }
}
