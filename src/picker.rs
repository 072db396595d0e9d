//! Host-facing driver around the picker model.
//!
//! `Picker` owns the model, the site source and the caller's change callback.
//! Inputs are plain method calls; retrievals run as futures that `settle`
//! drives to completion on the caller's task.

use crate::site::Site;
use crate::source::{self, SiteContext, SiteSource};
use crate::ui::{Effect, Fetch, LoadState, Model, Msg, PickerMode, PickerOption, PickerProps, initial_model};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::sync::Arc;

pub type ChangeCallback = Box<dyn FnMut(&[Site]) + Send>;

/// Run one retrieval and wrap its outcome as the completion message.
pub fn fetch_future(source: Arc<dyn SiteSource>, fetch: Fetch) -> BoxFuture<'static, Msg> {
    async move {
        let result = source::execute(source.as_ref(), &fetch.request).await;
        Msg::SitesLoaded {
            generation: fetch.generation,
            result,
        }
    }
    .boxed()
}

pub struct Picker {
    model: Model,
    source: Arc<dyn SiteSource>,
    on_change: Option<ChangeCallback>,
    in_flight: FuturesUnordered<BoxFuture<'static, Msg>>,
}

impl Picker {
    pub fn new(props: PickerProps, source: Arc<dyn SiteSource>) -> Self {
        let (model, effect) = initial_model(props);
        let mut p = Picker {
            model,
            source,
            on_change: None,
            in_flight: FuturesUnordered::new(),
        };
        p.apply(effect);
        p
    }

    pub fn with_on_change(mut self, f: impl FnMut(&[Site]) + Send + 'static) -> Self {
        self.on_change = Some(Box::new(f));
        self
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let effect = self.model.update(msg);
        self.apply(effect);
    }

    fn apply(&mut self, effect: Option<Effect>) {
        match effect {
            Some(Effect::Fetch(fetch)) => {
                self.in_flight.push(fetch_future(self.source.clone(), fetch));
            }
            Some(Effect::SelectionChanged(selection)) => {
                if let Some(cb) = self.on_change.as_mut() {
                    cb(&selection);
                }
            }
            None => {}
        }
    }

    /// Drive every in-flight retrieval to completion, applying results in the
    /// order they finish.
    pub async fn settle(&mut self) {
        while let Some(msg) = self.in_flight.next().await {
            self.dispatch(msg);
        }
    }

    pub fn set_context(&mut self, context: Option<SiteContext>) {
        self.dispatch(Msg::SetContext(context));
    }

    pub fn set_mode(&mut self, mode: PickerMode) {
        self.dispatch(Msg::SetMode(mode));
    }

    pub fn set_limit_to_current_site_collection(&mut self, limit: bool) {
        self.dispatch(Msg::SetLimitToCurrentSiteCollection(limit));
    }

    pub fn set_sort(&mut self, order_by: Option<&str>, is_desc: bool) {
        self.dispatch(Msg::SetSort {
            order_by: order_by.map(str::to_string),
            is_desc,
        });
    }

    pub fn set_initial_sites(&mut self, sites: Option<Vec<Site>>) {
        self.dispatch(Msg::SetInitialSites(sites));
    }

    pub fn toggle(&mut self, id: &str) {
        self.dispatch(Msg::ToggleSite(id.to_string()));
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn load_state(&self) -> &LoadState {
        &self.model.load_state
    }

    pub fn selection(&self) -> &[Site] {
        &self.model.selection
    }

    pub fn options(&self) -> Vec<PickerOption> {
        self.model.options()
    }

    pub fn fetch_count(&self) -> usize {
        self.model.fetches_issued
    }

    pub fn pending(&self) -> usize {
        self.in_flight.len()
    }
}
