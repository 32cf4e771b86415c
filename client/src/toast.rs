use gloo_timers::callback::Timeout;
use leptos::prelude::*;

use crate::config::TOAST_DURATION_MS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
}

/// Ordered list of visible notifications, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToastQueue {
    next_id: u64,
    items: Vec<Toast>,
}

impl ToastQueue {
    pub fn push(&mut self, message: impl Into<String>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.push(Toast {
            id,
            message: message.into(),
        });
        id
    }

    pub fn dismiss(&mut self, id: u64) {
        self.items.retain(|toast| toast.id != id);
    }

    pub fn items(&self) -> &[Toast] {
        &self.items
    }
}

#[derive(Clone, Copy)]
pub(crate) struct Toasts(pub RwSignal<ToastQueue>);

impl Toasts {
    /// Show `message` and drop it again after the toast duration.
    pub fn notify(self, message: impl Into<String>) {
        let mut id = 0;
        self.0.update(|queue| id = queue.push(message));
        let signal = self.0;
        Timeout::new(TOAST_DURATION_MS, move || {
            let _ = signal.try_update(|queue| queue.dismiss(id));
        })
        .forget();
    }
}

/// Fixed-position stack of transient notifications.
#[component]
pub fn Toaster() -> impl IntoView {
    let Toasts(toasts) = expect_context();

    view! {
        <div class="toaster" style="position: fixed; left: 16px; bottom: 16px; z-index: 1000; display: flex; flex-direction: column; gap: 8px;">
            <For
                each=move || toasts.with(|queue| queue.items().to_vec())
                key=|toast| toast.id
                children=move |toast| {
                    let id = toast.id;
                    view! {
                        <div
                            class="toast"
                            role="status"
                            style="background: #323232; color: #fff; padding: 10px 16px; border-radius: 4px; box-shadow: 0 2px 8px rgba(0,0,0,0.3); cursor: pointer;"
                            on:click=move |_| toasts.update(|queue| queue.dismiss(id))
                        >
                            {toast.message}
                        </div>
                    }
                }
            />
        </div>
    }
}
