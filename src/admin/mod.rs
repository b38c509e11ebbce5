//! Admin content editor.
//!
//! [`Dashboard`] holds the operator's working copy of the three content
//! collections. Local state is only patched after the backend confirms a
//! mutation, so a failed call never needs rolling back.

mod status;

pub use status::*;

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::backend::{BackendError, Client};
use crate::content::in_display_order;
use crate::lifecycle::Scope;
use crate::models::{
    GalleryImage, GalleryImageUpdate, HeroContent, NewGalleryImage, NewTestimonial, Testimonial,
    TestimonialUpdate, HERO_ID,
};

pub const LOAD_FAILED: &str = "Failed to load content. Please refresh the page.";
pub const HERO_FIELDS_REQUIRED: &str = "All hero fields are required.";
pub const IMAGE_FIELDS_REQUIRED: &str = "Image URL and alt text are required.";
pub const TESTIMONIAL_FIELDS_REQUIRED: &str = "Name and testimonial text are required.";
pub const NOTHING_TO_UPDATE: &str = "Nothing to update.";

/// Why an editor action did not go through.
#[derive(Debug, Error)]
pub enum EditError {
    #[error("{0}")]
    Invalid(&'static str),

    #[error("Another save is in progress.")]
    Busy,

    #[error("Deletion was not confirmed.")]
    Declined,

    #[error("No record with id {0}.")]
    UnknownRecord(String),

    #[error("The editor was closed before the request finished.")]
    TornDown,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Dashboard tabs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Tab {
    #[default]
    Hero,
    Gallery,
    Testimonials,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Hero, Tab::Gallery, Tab::Testimonials];

    /// Unknown names fall back to the hero tab.
    pub fn from_query(name: Option<&str>) -> Self {
        match name {
            Some("gallery") => Tab::Gallery,
            Some("testimonials") => Tab::Testimonials,
            _ => Tab::Hero,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Hero => "hero",
            Tab::Gallery => "gallery",
            Tab::Testimonials => "testimonials",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tab::Hero => "Hero Content",
            Tab::Gallery => "Gallery",
            Tab::Testimonials => "Testimonials",
        }
    }
}

/// Editable hero fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeroForm {
    pub title: String,
    pub subtitle: String,
    pub cta_text: String,
}

impl HeroForm {
    /// Trimmed copy, or `None` when any field is blank.
    pub fn normalized(&self) -> Option<Self> {
        let title = self.title.trim();
        let subtitle = self.subtitle.trim();
        let cta_text = self.cta_text.trim();
        if title.is_empty() || subtitle.is_empty() || cta_text.is_empty() {
            return None;
        }
        Some(Self {
            title: title.to_string(),
            subtitle: subtitle.to_string(),
            cta_text: cta_text.to_string(),
        })
    }
}

impl From<&HeroContent> for HeroForm {
    fn from(hero: &HeroContent) -> Self {
        Self {
            title: hero.title.clone(),
            subtitle: hero.subtitle.clone(),
            cta_text: hero.cta_text.clone(),
        }
    }
}

/// Next display position: one past the highest existing index, never below 1.
pub fn next_order_index(indices: impl IntoIterator<Item = i64>) -> i64 {
    indices.into_iter().max().unwrap_or(0).max(0) + 1
}

/// Snapshot of the editor for rendering.
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub hero: HeroForm,
    pub gallery: Vec<GalleryImage>,
    pub testimonials: Vec<Testimonial>,
    pub editing: Option<String>,
    pub form_error: Option<String>,
    pub status: Option<StatusMessage>,
    pub saving: bool,
}

#[derive(Debug, Default)]
struct EditorState {
    hero: HeroForm,
    gallery: Vec<GalleryImage>,
    testimonials: Vec<Testimonial>,
    editing: Option<String>,
    form_error: Option<String>,
    status: StatusSlot,
}

/// A list collection the editor manages.
trait Record: Clone + DeserializeOwned + Send + Sync + 'static {
    const TABLE: &'static str;
    const NOUN: &'static str;
    type Patch: Serialize + Send + Sync;

    fn id(&self) -> &str;
    fn order_index(&self) -> i64;
    fn apply(&mut self, patch: &Self::Patch);
    fn list(state: &mut EditorState) -> &mut Vec<Self>;
}

impl Record for GalleryImage {
    const TABLE: &'static str = GalleryImage::TABLE;
    const NOUN: &'static str = "Gallery image";
    type Patch = GalleryImageUpdate;

    fn id(&self) -> &str {
        &self.id
    }

    fn order_index(&self) -> i64 {
        self.order_index
    }

    fn apply(&mut self, patch: &GalleryImageUpdate) {
        if let Some(url) = &patch.image_url {
            self.image_url = url.clone();
        }
        if let Some(alt) = &patch.alt_text {
            self.alt_text = alt.clone();
        }
        if let Some(index) = patch.order_index {
            self.order_index = index;
        }
    }

    fn list(state: &mut EditorState) -> &mut Vec<Self> {
        &mut state.gallery
    }
}

impl Record for Testimonial {
    const TABLE: &'static str = Testimonial::TABLE;
    const NOUN: &'static str = "Testimonial";
    type Patch = TestimonialUpdate;

    fn id(&self) -> &str {
        &self.id
    }

    fn order_index(&self) -> i64 {
        self.order_index
    }

    fn apply(&mut self, patch: &TestimonialUpdate) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(content) = &patch.content {
            self.content = content.clone();
        }
        if let Some(index) = patch.order_index {
            self.order_index = index;
        }
    }

    fn list(state: &mut EditorState) -> &mut Vec<Self> {
        &mut state.testimonials
    }
}

/// Clears the saving flag when the action ends, however it ends.
struct SavingGuard<'a>(&'a AtomicBool);

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Trim a provided text field; blank is an error.
fn trimmed(field: Option<String>, message: &'static str) -> Result<Option<String>, EditError> {
    match field {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Err(EditError::Invalid(message)),
        Some(value) => Ok(Some(value.trim().to_string())),
    }
}

pub struct Dashboard {
    client: Client,
    scope: Scope,
    saving: AtomicBool,
    state: Mutex<EditorState>,
}

impl Dashboard {
    /// An empty editor; call [`Dashboard::fetch_data`] to load it.
    pub fn new(client: Client, scope: Scope) -> Self {
        Self {
            client,
            scope,
            saving: AtomicBool::new(false),
            state: Mutex::new(EditorState::default()),
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn teardown(&self) {
        self.scope.teardown();
    }

    fn state(&self) -> MutexGuard<'_, EditorState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn is_saving(&self) -> bool {
        self.saving.load(Ordering::Acquire)
    }

    pub fn view(&self) -> DashboardView {
        let state = self.state();
        DashboardView {
            hero: state.hero.clone(),
            gallery: state.gallery.clone(),
            testimonials: state.testimonials.clone(),
            editing: state.editing.clone(),
            form_error: state.form_error.clone(),
            status: state.status.current().cloned(),
            saving: self.is_saving(),
        }
    }

    pub fn begin_edit(&self, id: &str) {
        self.state().editing = Some(id.to_string());
    }

    pub fn cancel_edit(&self) {
        self.state().editing = None;
    }

    fn post(&self, message: StatusMessage) {
        self.state().status.post(message);
    }

    fn reject(&self, message: &'static str) -> EditError {
        self.state().form_error = Some(message.to_string());
        EditError::Invalid(message)
    }

    /// Load the hero row and both lists. Each read stands alone: a failure
    /// leaves that collection as it was and posts the load-failure banner.
    /// A clean reload takes that banner down again.
    pub async fn fetch_data(&self) {
        let client = &self.client;
        let reads = async {
            tokio::join!(
                client
                    .from(HeroContent::TABLE)
                    .select("*")
                    .eq("id", HERO_ID)
                    .fetch_optional::<HeroContent>(),
                client
                    .from(GalleryImage::TABLE)
                    .select("*")
                    .order("order_index", true)
                    .fetch::<GalleryImage>(),
                client
                    .from(Testimonial::TABLE)
                    .select("*")
                    .order("order_index", true)
                    .fetch::<Testimonial>(),
            )
        };

        let Some((hero, gallery, testimonials)) = self.scope.run(reads).await else {
            tracing::debug!("Dashboard torn down before its data arrived");
            return;
        };

        let mut failed = false;
        let mut state = self.state();

        match hero {
            Ok(Some(hero)) => state.hero = HeroForm::from(&hero),
            Ok(None) => tracing::debug!("No hero row yet"),
            Err(err) => {
                tracing::error!(error = %err, "Error fetching hero content");
                failed = true;
            }
        }
        match gallery {
            Ok(rows) => state.gallery = in_display_order(rows, |r| r.order_index),
            Err(err) => {
                tracing::error!(error = %err, "Error fetching gallery images");
                failed = true;
            }
        }
        match testimonials {
            Ok(rows) => state.testimonials = in_display_order(rows, |r| r.order_index),
            Err(err) => {
                tracing::error!(error = %err, "Error fetching testimonials");
                failed = true;
            }
        }

        if failed {
            state.status.post(StatusMessage::error(LOAD_FAILED));
        } else if state.status.current() == Some(&StatusMessage::error(LOAD_FAILED)) {
            state.status.clear();
        }
    }

    fn begin_save(&self) -> Result<SavingGuard<'_>, EditError> {
        if self
            .saving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.post(StatusMessage::error(EditError::Busy.to_string()));
            return Err(EditError::Busy);
        }
        Ok(SavingGuard(&self.saving))
    }

    /// Run one backend mutation under the saving guard and the scope.
    async fn mutate<T, F>(&self, action: &str, call: F) -> Result<T, EditError>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        let _guard = self.begin_save()?;
        match self.scope.run(call).await {
            None => Err(EditError::TornDown),
            Some(Ok(value)) => Ok(value),
            Some(Err(err)) => {
                tracing::error!(error = %err, action, "Content mutation failed");
                self.post(StatusMessage::error(err.user_message()));
                Err(err.into())
            }
        }
    }

    /// Validate and upsert the hero singleton.
    pub async fn update_hero_content(&self, form: HeroForm) -> Result<(), EditError> {
        self.state().hero = form.clone();
        let Some(form) = form.normalized() else {
            return Err(self.reject(HERO_FIELDS_REQUIRED));
        };

        let row = HeroContent {
            id: HERO_ID,
            title: form.title.clone(),
            subtitle: form.subtitle.clone(),
            cta_text: form.cta_text.clone(),
            updated_at: Some(Utc::now()),
        };
        let request = self.client.from(HeroContent::TABLE).upsert(&row)?;
        self.mutate("update hero", request.execute()).await?;

        let mut state = self.state();
        state.hero = form;
        state.form_error = None;
        state.status
            .post(StatusMessage::success("Hero content updated successfully!"));
        Ok(())
    }

    pub async fn add_gallery_image(
        &self,
        image_url: &str,
        alt_text: &str,
    ) -> Result<GalleryImage, EditError> {
        let (image_url, alt_text) = (image_url.trim(), alt_text.trim());
        if image_url.is_empty() || alt_text.is_empty() {
            return Err(self.reject(IMAGE_FIELDS_REQUIRED));
        }
        self.insert_record::<GalleryImage, _>(|order_index| NewGalleryImage {
            image_url: image_url.to_string(),
            alt_text: alt_text.to_string(),
            order_index,
        })
        .await
    }

    pub async fn add_testimonial(
        &self,
        name: &str,
        content: &str,
    ) -> Result<Testimonial, EditError> {
        let (name, content) = (name.trim(), content.trim());
        if name.is_empty() || content.is_empty() {
            return Err(self.reject(TESTIMONIAL_FIELDS_REQUIRED));
        }
        self.insert_record::<Testimonial, _>(|order_index| NewTestimonial {
            name: name.to_string(),
            content: content.to_string(),
            order_index,
        })
        .await
    }

    pub async fn update_gallery_image(
        &self,
        id: &str,
        updates: GalleryImageUpdate,
    ) -> Result<(), EditError> {
        let patch = GalleryImageUpdate {
            image_url: trimmed(updates.image_url, IMAGE_FIELDS_REQUIRED)
                .map_err(|_| self.reject(IMAGE_FIELDS_REQUIRED))?,
            alt_text: trimmed(updates.alt_text, IMAGE_FIELDS_REQUIRED)
                .map_err(|_| self.reject(IMAGE_FIELDS_REQUIRED))?,
            order_index: updates.order_index,
        };
        if patch.is_empty() {
            return Err(self.reject(NOTHING_TO_UPDATE));
        }
        self.update_record::<GalleryImage>(id, patch).await
    }

    pub async fn update_testimonial(
        &self,
        id: &str,
        updates: TestimonialUpdate,
    ) -> Result<(), EditError> {
        let patch = TestimonialUpdate {
            name: trimmed(updates.name, TESTIMONIAL_FIELDS_REQUIRED)
                .map_err(|_| self.reject(TESTIMONIAL_FIELDS_REQUIRED))?,
            content: trimmed(updates.content, TESTIMONIAL_FIELDS_REQUIRED)
                .map_err(|_| self.reject(TESTIMONIAL_FIELDS_REQUIRED))?,
            order_index: updates.order_index,
        };
        if patch.is_empty() {
            return Err(self.reject(NOTHING_TO_UPDATE));
        }
        self.update_record::<Testimonial>(id, patch).await
    }

    /// Delete after `confirm` approves the record.
    pub async fn delete_gallery_image(
        &self,
        id: &str,
        confirm: impl FnOnce(&GalleryImage) -> bool,
    ) -> Result<(), EditError> {
        self.delete_record::<GalleryImage>(id, confirm).await
    }

    pub async fn delete_testimonial(
        &self,
        id: &str,
        confirm: impl FnOnce(&Testimonial) -> bool,
    ) -> Result<(), EditError> {
        self.delete_record::<Testimonial>(id, confirm).await
    }

    async fn insert_record<T, N>(&self, build: impl FnOnce(i64) -> N) -> Result<T, EditError>
    where
        T: Record,
        N: Serialize,
    {
        let order_index = {
            let mut state = self.state();
            next_order_index(T::list(&mut state).iter().map(T::order_index))
        };
        let request = self.client.from(T::TABLE).insert(&build(order_index))?;

        let created: T = self
            .mutate("insert", async {
                let rows = request.fetch::<T>().await?;
                rows.into_iter().next().ok_or(BackendError::MissingRow)
            })
            .await?;

        let mut state = self.state();
        T::list(&mut state).push(created.clone());
        state.form_error = None;
        state
            .status
            .post(StatusMessage::success(format!("{} added successfully!", T::NOUN)));
        Ok(created)
    }

    async fn update_record<T: Record>(&self, id: &str, patch: T::Patch) -> Result<(), EditError> {
        let known = {
            let mut state = self.state();
            T::list(&mut state).iter().any(|r| r.id() == id)
        };
        if !known {
            return Err(EditError::UnknownRecord(id.to_string()));
        }

        let request = self.client.from(T::TABLE).update(&patch)?.eq("id", id);
        self.mutate("update", request.execute()).await?;

        let mut state = self.state();
        if let Some(record) = T::list(&mut state).iter_mut().find(|r| r.id() == id) {
            record.apply(&patch);
        }
        if state.editing.as_deref() == Some(id) {
            state.editing = None;
        }
        state.form_error = None;
        state
            .status
            .post(StatusMessage::success(format!("{} updated successfully!", T::NOUN)));
        Ok(())
    }

    async fn delete_record<T: Record>(
        &self,
        id: &str,
        confirm: impl FnOnce(&T) -> bool,
    ) -> Result<(), EditError> {
        let target = {
            let mut state = self.state();
            T::list(&mut state).iter().find(|r| r.id() == id).cloned()
        };
        let Some(target) = target else {
            return Err(EditError::UnknownRecord(id.to_string()));
        };
        if !confirm(&target) {
            return Err(EditError::Declined);
        }

        let request = self.client.from(T::TABLE).delete().eq("id", id);
        self.mutate("delete", request.execute()).await?;

        let mut state = self.state();
        T::list(&mut state).retain(|r| r.id() != id);
        if state.editing.as_deref() == Some(id) {
            state.editing = None;
        }
        state
            .status
            .post(StatusMessage::success(format!("{} deleted successfully!", T::NOUN)));
        Ok(())
    }
}
