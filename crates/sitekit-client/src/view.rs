//! Render target for a single form.
//!
//! [`FormView`] is the plain-data stand-in for the DOM subtree a controller
//! owns: field values and their error annotations, the status area, the
//! submit control, an attached file input, an image preview, a pending
//! navigation, and the rendered blog list. Controllers only ever write here;
//! adapters (the CLI, tests) read it back.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{FormData, ImageFile};

/// Tone of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// The status area's current content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub kind: StatusKind,
    pub text: String,
}

/// State of the form's submit control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    pub enabled: bool,
    pub label: String,
    idle_label: String,
}

impl SubmitControl {
    /// The label shown when no request is in flight.
    pub fn idle_label(&self) -> &str {
        &self.idle_label
    }
}

/// One rendered row of the admin blog list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlogRow {
    pub id: String,
    pub title: String,
    pub slug: String,
    /// Creation date as `YYYY-MM-DD`, or the raw value if it did not parse.
    pub created: String,
}

/// The admin blog list area.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BlogList {
    #[default]
    NotLoaded,
    /// Rendered as "No blog posts yet."
    Empty,
    Rows(Vec<BlogRow>),
}

#[derive(Debug, Clone)]
pub struct FormView {
    values: FormData,
    hidden: BTreeSet<String>,
    files: BTreeMap<String, ImageFile>,
    field_errors: BTreeMap<String, String>,
    status: Option<Status>,
    submit: SubmitControl,
    preview: Option<String>,
    navigation: Option<String>,
    blog_list: BlogList,
}

impl FormView {
    /// An empty form whose submit control reads `submit_label`.
    pub fn new(submit_label: &str) -> Self {
        Self {
            values: FormData::new(),
            hidden: BTreeSet::new(),
            files: BTreeMap::new(),
            field_errors: BTreeMap::new(),
            status: None,
            submit: SubmitControl {
                enabled: true,
                label: submit_label.to_owned(),
                idle_label: submit_label.to_owned(),
            },
            preview: None,
            navigation: None,
            blog_list: BlogList::NotLoaded,
        }
    }

    /// Pre-fill field values.
    #[must_use]
    pub fn with_values<K, V>(mut self, values: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in values {
            self.values.insert(k.into(), v.into());
        }
        self
    }

    /// Declare `field` hidden: [`reset`](Self::reset) leaves its value alone.
    #[must_use]
    pub fn with_hidden(mut self, field: &str) -> Self {
        self.hidden.insert(field.to_owned());
        self
    }

    // --- Field values ---

    /// Current value of `field`; a missing field reads as empty.
    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map_or("", String::as_str)
    }

    pub fn set_value(&mut self, field: &str, value: &str) {
        self.values.insert(field.to_owned(), value.to_owned());
    }

    pub fn values(&self) -> &FormData {
        &self.values
    }

    // --- File inputs ---

    pub fn attach_file(&mut self, field: &str, file: ImageFile) {
        self.files.insert(field.to_owned(), file);
    }

    pub fn file(&self, field: &str) -> Option<&ImageFile> {
        self.files.get(field)
    }

    pub fn clear_file(&mut self, field: &str) {
        self.files.remove(field);
    }

    // --- Inline errors ---

    /// Annotate `field` with an error. The first message per field wins.
    pub fn mark_error(&mut self, field: &str, message: &str) {
        self.field_errors
            .entry(field.to_owned())
            .or_insert_with(|| message.to_owned());
    }

    pub fn field_error(&self, field: &str) -> Option<&str> {
        self.field_errors.get(field).map(String::as_str)
    }

    pub fn field_errors(&self) -> impl Iterator<Item = (&str, &str)> {
        self.field_errors
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn has_errors(&self) -> bool {
        !self.field_errors.is_empty()
    }

    pub fn clear_errors(&mut self) {
        self.field_errors.clear();
    }

    // --- Status area ---

    pub fn show_status(&mut self, kind: StatusKind, text: impl Into<String>) {
        self.status = Some(Status {
            kind,
            text: text.into(),
        });
    }

    pub fn hide_status(&mut self) {
        self.status = None;
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    // --- Submit control ---

    /// Disable the submit control and swap in an in-progress label.
    pub fn begin_busy(&mut self, label: &str) {
        self.submit.enabled = false;
        self.submit.label = label.to_owned();
    }

    /// Re-enable the submit control with its original label.
    pub fn restore_submit(&mut self) {
        self.submit.enabled = true;
        self.submit.label.clone_from(&self.submit.idle_label);
    }

    pub fn submit(&self) -> &SubmitControl {
        &self.submit
    }

    // --- Reset ---

    /// Clear all non-hidden values, attached files, and inline errors.
    pub fn reset(&mut self) {
        let hidden = &self.hidden;
        self.values.retain(|k, _| hidden.contains(k));
        self.files.clear();
        self.field_errors.clear();
    }

    // --- Preview, navigation, blog list ---

    pub fn set_preview(&mut self, url: Option<String>) {
        self.preview = url.filter(|u| !u.is_empty());
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn navigate(&mut self, path: &str) {
        self.navigation = Some(path.to_owned());
    }

    /// Path the controller asked to navigate to, if any.
    pub fn navigation(&self) -> Option<&str> {
        self.navigation.as_deref()
    }

    pub fn set_blog_list(&mut self, list: BlogList) {
        self.blog_list = list;
    }

    pub fn blog_list(&self) -> &BlogList {
        &self.blog_list
    }
}
