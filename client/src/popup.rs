use leptos::callback::{Callable, Callback};
use leptos::prelude::*;
use registry_shared::Facility;

/// Disambiguation list for facilities that share one map point.
#[component]
pub fn FacilitiesMapPopup(
    facilities: Vec<Facility>,
    selected_id: Option<String>,
    on_select: Callback<String>,
    on_close: Callback<()>,
) -> impl IntoView {
    let count = facilities.len();

    view! {
        <div class="facilities-map-popup">
            <div class="facilities-map-popup__header" style="display: flex; justify-content: space-between; align-items: center; gap: 12px; margin-bottom: 6px;">
                <strong>{format!("{count} facilities at this location")}</strong>
                <button
                    class="facilities-map-popup__close"
                    title="Close"
                    style="background: none; border: none; cursor: pointer; font-size: 1rem;"
                    on:click=move |_| on_close.run(())
                >
                    "\u{00D7}"
                </button>
            </div>
            <ul class="facilities-map-popup__list" style="list-style: none; margin: 0; padding: 0; max-height: 240px; overflow-y: auto;">
                {facilities
                    .into_iter()
                    .map(|facility| {
                        let is_selected = selected_id.as_deref() == Some(facility.id.as_str());
                        let name = facility.display_name().to_string();
                        let address = facility.properties.address.clone().unwrap_or_default();
                        let id = facility.id;
                        let item_class = if is_selected {
                            "facilities-map-popup__item facilities-map-popup__item--selected"
                        } else {
                            "facilities-map-popup__item"
                        };
                        view! {
                            <li
                                class=item_class
                                style="padding: 6px 4px; cursor: pointer; border-bottom: 1px solid #eee;"
                                on:click=move |_| on_select.run(id.clone())
                            >
                                <div style="font-weight: 600;">{name}</div>
                                <div style="font-size: 0.8rem; color: #666;">{address}</div>
                            </li>
                        }
                    })
                    .collect_view()}
            </ul>
        </div>
    }
}
