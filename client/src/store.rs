use std::cell::RefCell;

use leptos::prelude::*;
use registry_shared::{Facility, FacilityCollection};
use serde::{Deserialize, Deserializer, Serialize};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use crate::config::{BOOTSTRAP_ELEMENT_ID, DEFAULT_COUNTRY_CODE, STATE_EVENT_NAME};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    pub user: Option<User>,
    pub fetching: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilitiesState {
    pub fetching: bool,
    pub data: Option<FacilityCollection>,
    /// Bumped whenever `data` is replaced, so views can watch the collection
    /// without cloning or comparing it.
    #[serde(skip)]
    pub version: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientInfoState {
    pub fetched: bool,
    pub country_code: Option<String>,
}

impl ClientInfoState {
    pub fn country_code(&self) -> &str {
        self.country_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
            .unwrap_or(DEFAULT_COUNTRY_CODE)
    }
}

/// Everything the views read from the host application.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryState {
    pub session: SessionState,
    pub facilities: FacilitiesState,
    pub single_facility: Option<Facility>,
    pub client_info: ClientInfoState,
    pub embed: bool,
    pub reset_button_click_count: u64,
}

/// Initial page state embedded by the host.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Bootstrap {
    pub google_api_key: String,
    #[serde(flatten)]
    pub state: RegistryState,
}

/// Partial update pushed by the host. Absent fields are left untouched at
/// every level; an explicit `null` clears a nullable field.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct StateUpdate {
    pub session: Option<SessionUpdate>,
    pub facilities: Option<FacilitiesUpdate>,
    #[serde(deserialize_with = "present_or_null")]
    pub single_facility: Option<Option<Facility>>,
    pub client_info: Option<ClientInfoUpdate>,
    pub embed: Option<bool>,
    pub reset_button_click_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct SessionUpdate {
    #[serde(deserialize_with = "present_or_null")]
    pub user: Option<Option<User>>,
    pub fetching: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct FacilitiesUpdate {
    pub fetching: Option<bool>,
    #[serde(deserialize_with = "present_or_null")]
    pub data: Option<Option<FacilityCollection>>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ClientInfoUpdate {
    pub fetched: Option<bool>,
    #[serde(deserialize_with = "present_or_null")]
    pub country_code: Option<Option<String>>,
}

fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl SessionState {
    fn apply(&mut self, update: SessionUpdate) {
        if let Some(user) = update.user {
            self.user = user;
        }
        if let Some(fetching) = update.fetching {
            self.fetching = fetching;
        }
    }
}

impl FacilitiesState {
    fn apply(&mut self, update: FacilitiesUpdate) {
        if let Some(fetching) = update.fetching {
            self.fetching = fetching;
        }
        if let Some(data) = update.data {
            self.data = data;
            self.version = self.version.wrapping_add(1);
        }
    }
}

impl ClientInfoState {
    fn apply(&mut self, update: ClientInfoUpdate) {
        if let Some(fetched) = update.fetched {
            self.fetched = fetched;
        }
        if let Some(country_code) = update.country_code {
            self.country_code = country_code;
        }
    }
}

impl RegistryState {
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(session) = update.session {
            self.session.apply(session);
        }
        if let Some(facilities) = update.facilities {
            self.facilities.apply(facilities);
        }
        if let Some(single_facility) = update.single_facility {
            self.single_facility = single_facility;
        }
        if let Some(client_info) = update.client_info {
            self.client_info.apply(client_info);
        }
        if let Some(embed) = update.embed {
            self.embed = embed;
        }
        if let Some(count) = update.reset_button_click_count {
            self.reset_button_click_count = count;
        }
    }
}

/// Reactive root for [`RegistryState`]. Views read narrow [`Memo`] slices so
/// unrelated updates do not re-run their effects.
#[derive(Clone, Copy)]
pub(crate) struct Store(pub RwSignal<RegistryState>);

impl Store {
    pub fn apply(self, update: StateUpdate) {
        self.0.update(|state| state.apply(update));
    }

    pub fn signed_in(self) -> Memo<bool> {
        Memo::new(move |_| self.0.with(|s| s.session.user.is_some()))
    }

    pub fn session_loading(self) -> Memo<bool> {
        Memo::new(move |_| self.0.with(|s| s.session.fetching))
    }

    pub fn fetching(self) -> Memo<bool> {
        Memo::new(move |_| self.0.with(|s| s.facilities.fetching))
    }

    /// Changes whenever the facility collection is replaced. Pair with
    /// [`Store::with_facilities_untracked`] to read the collection itself.
    pub fn facilities_version(self) -> Memo<u64> {
        Memo::new(move |_| self.0.with(|s| s.facilities.version))
    }

    pub fn with_facilities_untracked<R>(
        self,
        f: impl FnOnce(Option<&FacilityCollection>) -> R,
    ) -> R {
        self.0.with_untracked(|s| f(s.facilities.data.as_ref()))
    }

    pub fn focused_facility(self) -> Memo<Option<Facility>> {
        Memo::new(move |_| self.0.with(|s| s.single_facility.clone()))
    }

    pub fn reset_counter(self) -> Memo<u64> {
        Memo::new(move |_| self.0.with(|s| s.reset_button_click_count))
    }

    pub fn client_info_fetched(self) -> Memo<bool> {
        Memo::new(move |_| self.0.with(|s| s.client_info.fetched))
    }

    pub fn embedded(self) -> Memo<bool> {
        Memo::new(move |_| self.0.with(|s| s.embed))
    }

    pub fn request_reset(self) {
        self.0
            .update(|s| s.reset_button_click_count = s.reset_button_click_count.wrapping_add(1));
    }
}

pub fn parse_bootstrap(raw: &str) -> Result<Bootstrap, String> {
    serde_json::from_str(raw).map_err(|e| format!("bootstrap parse error: {e}"))
}

/// Read the bootstrap document from the host page. Falls back to defaults.
pub(crate) fn read_bootstrap() -> Bootstrap {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return Bootstrap::default();
    };
    let Some(raw) = document
        .get_element_by_id(BOOTSTRAP_ELEMENT_ID)
        .and_then(|el| el.text_content())
    else {
        web_sys::console::info_1(&format!("No #{BOOTSTRAP_ELEMENT_ID} element; using defaults").into());
        return Bootstrap::default();
    };
    match parse_bootstrap(&raw) {
        Ok(bootstrap) => bootstrap,
        Err(e) => {
            web_sys::console::warn_1(&e.into());
            Bootstrap::default()
        }
    }
}

struct StateEventBinding {
    window: web_sys::Window,
    _handler: Closure<dyn Fn(web_sys::CustomEvent)>,
}

thread_local! {
    static STATE_EVENT_BINDING: RefCell<Option<StateEventBinding>> = const { RefCell::new(None) };
}

/// Apply every `registry:state` event the host dispatches on `window`.
pub(crate) fn listen_for_updates(store: Store) {
    let Some(window) = web_sys::window() else {
        return;
    };

    stop_listening();

    let handler = Closure::<dyn Fn(web_sys::CustomEvent)>::new(move |e: web_sys::CustomEvent| {
        match serde_wasm_bindgen::from_value::<StateUpdate>(e.detail()) {
            Ok(update) => store.apply(update),
            Err(err) => {
                web_sys::console::warn_1(&format!("Ignoring malformed state update: {err}").into());
            }
        }
    });
    if window
        .add_event_listener_with_callback(STATE_EVENT_NAME, handler.as_ref().unchecked_ref())
        .is_ok()
    {
        STATE_EVENT_BINDING.with(|slot| {
            *slot.borrow_mut() = Some(StateEventBinding {
                window: window.clone(),
                _handler: handler,
            });
        });
    }
}

pub(crate) fn stop_listening() {
    STATE_EVENT_BINDING.with(|slot| {
        if let Some(old) = slot.borrow_mut().take() {
            let _ = old.window.remove_event_listener_with_callback(
                STATE_EVENT_NAME,
                old._handler.as_ref().unchecked_ref(),
            );
        }
    });
}
