use leptos::prelude::*;

use crate::config::{AUTH_LOGIN_FORM_ROUTE, LISTS_ROUTE, contribute_instructions_url, data_quality_url};

/// Which of the three Contribute page states is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContributeState {
    Loading,
    LoginPrompt,
    UploadForm,
}

impl ContributeState {
    /// Session loading wins over the signed-in flag.
    pub const fn select(signed_in: bool, session_loading: bool) -> Self {
        if session_loading {
            Self::Loading
        } else if signed_in {
            Self::UploadForm
        } else {
            Self::LoginPrompt
        }
    }
}

/// Contribute page. The upload form itself is supplied by the caller as `children`.
#[component]
pub fn ContributeView(
    #[prop(into)] signed_in: Signal<bool>,
    #[prop(into)] session_loading: Signal<bool>,
    children: ChildrenFn,
) -> impl IntoView {
    let state = Memo::new(move |_| ContributeState::select(signed_in.get(), session_loading.get()));

    view! {
        <section class="app-grid">
            <h2 class="app-grid__title">"Contribute"</h2>
            {move || match state.get() {
                ContributeState::Loading => view! {
                    <div class="margin-bottom-64">
                        <div class="spinner" role="progressbar" aria-label="Loading session" />
                    </div>
                }
                .into_any(),
                ContributeState::LoginPrompt => view! {
                    <div class="margin-bottom-64">
                        <a href=AUTH_LOGIN_FORM_ROUTE>
                            "Log in to contribute to Open Apparel Registry"
                        </a>
                    </div>
                }
                .into_any(),
                ContributeState::UploadForm => view! {
                    <div class="app-overflow margin-bottom-64">
                        <p>"Thank you for contributing your data to the Open Apparel Registry."</p>
                        <p>
                            <a href=contribute_instructions_url() target="_blank" rel="noreferrer">
                                "Please follow these step-by-step instructions"
                            </a>
                            " to prepare and upload your data to the OAR via CSV or Excel file."
                        </p>
                        <p>
                            "Once you have read the instructions and prepared your file, submit your list using the fields below."
                        </p>
                        <div class="paper" style="padding: 20px; margin-bottom: 20px;">
                            {children()}
                        </div>
                        <div class="paper" style="padding: 20px;">
                            <div class="form__field">
                                <p class="form__label">
                                    "Once the list has been successfully uploaded, you will receive an email letting you know "
                                    <a href=data_quality_url() target="_blank" rel="noreferrer">
                                        "your list processing"
                                    </a>
                                    " is complete. You can then view your list, resolve errors, and confirm or reject matches."
                                </p>
                            </div>
                            <div class="form__field">
                                <a
                                    href=LISTS_ROUTE
                                    class="outlined-button outlined-button--link margin-top-16"
                                >
                                    "View My Lists"
                                </a>
                            </div>
                        </div>
                    </div>
                }
                .into_any(),
            }}
        </section>
    }
}

/// Mount point the host's upload form renders into.
#[component]
pub fn ContributeFormSlot() -> impl IntoView {
    view! { <div id="contribute-form" class="contribute-form" /> }
}

#[cfg(test)]
mod tests {
    use super::ContributeState;

    #[test]
    fn loading_takes_priority() {
        assert_eq!(ContributeState::select(true, true), ContributeState::Loading);
        assert_eq!(ContributeState::select(false, true), ContributeState::Loading);
    }

    #[test]
    fn signed_in_shows_upload_form() {
        assert_eq!(ContributeState::select(true, false), ContributeState::UploadForm);
    }

    #[test]
    fn signed_out_shows_login_prompt() {
        assert_eq!(ContributeState::select(false, false), ContributeState::LoginPrompt);
    }
}
