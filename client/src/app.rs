use leptos::prelude::*;

use crate::contribute::{ContributeFormSlot, ContributeView};
use crate::map_view::MapView;
use crate::route::{self, CurrentRoute, Route};
use crate::store::{self, Store};
use crate::toast::{ToastQueue, Toaster, Toasts};

/// Top-level page, independent of the deep-linked facility so the map stays
/// mounted while the user moves between facilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Map,
    Contribute,
}

/// Root application component. Provides the store, route and toasts via context.
#[component]
pub fn App() -> impl IntoView {
    let bootstrap = store::read_bootstrap();
    let store = Store(RwSignal::new(bootstrap.state));
    let current_route = CurrentRoute(RwSignal::new(Route::parse(&route::current_path())));
    let toasts = Toasts(RwSignal::new(ToastQueue::default()));
    let google_api_key = bootstrap.google_api_key;

    provide_context(store);
    provide_context(current_route);
    provide_context(toasts);

    Effect::new(move || {
        store::listen_for_updates(store);
        route::watch_popstate(current_route);
        on_cleanup(|| {
            store::stop_listening();
            route::unwatch_popstate();
        });
    });

    let page = Memo::new(move |_| match current_route.0.get() {
        Route::Map { .. } => Page::Map,
        Route::Contribute => Page::Contribute,
    });
    let signed_in = store.signed_in();
    let session_loading = store.session_loading();
    let client_info_fetched = store.client_info_fetched();

    view! {
        <div class="app" style="width: 100%; height: 100%; display: flex; flex-direction: column;">
            <Header page=page />
            <main style="flex: 1; position: relative; overflow: auto;">
                {move || match page.get() {
                    Page::Map => {
                        if client_info_fetched.get() {
                            view! { <MapView google_api_key=google_api_key.clone() /> }.into_any()
                        } else {
                            ().into_any()
                        }
                    }
                    Page::Contribute => view! {
                        <ContributeView signed_in=signed_in session_loading=session_loading>
                            <ContributeFormSlot />
                        </ContributeView>
                    }
                    .into_any(),
                }}
            </main>
            <Toaster />
        </div>
    }
}

#[component]
fn Header(page: Memo<Page>) -> impl IntoView {
    let store: Store = expect_context();
    let current_route: CurrentRoute = expect_context();

    let go = move |route: Route| {
        move |e: web_sys::MouseEvent| {
            e.prevent_default();
            route::navigate(current_route, route.clone());
        }
    };

    view! {
        <header class="app-header" style="display: flex; align-items: center; gap: 16px; padding: 8px 16px; border-bottom: 1px solid #ddd;">
            <a
                href=Route::Map { facility_id: None }.path()
                class:active=move || page.get() == Page::Map
                on:click=go(Route::Map { facility_id: None })
            >
                "Facilities"
            </a>
            <a
                href=Route::Contribute.path()
                class:active=move || page.get() == Page::Contribute
                on:click=go(Route::Contribute)
            >
                "Contribute"
            </a>
            {move || {
                (page.get() == Page::Map).then(|| view! {
                    <button
                        class="outlined-button"
                        style="margin-left: auto;"
                        title="Reset the map to its default view"
                        on:click=move |_| store.request_reset()
                    >
                        "Reset"
                    </button>
                })
            }}
        </header>
    }
}
