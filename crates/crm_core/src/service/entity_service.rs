//! CRUD and search for the CRM entity screens.
//!
//! # Invariants
//! - Search is a case-insensitive substring match over the screen's text
//!   fields, AND-ed with an optional exact facet (status, stage, type).
//! - An empty search text matches everything.
//! - Filtering keeps the backend's newest-first order.

use super::ServiceResult;
use crate::backend::EntityApi;
use crate::model::activity::{Communication, CommunicationKind, Task, TaskStatus};
use crate::model::campaign::Campaign;
use crate::model::sales::{Account, Contact, Deal, DealStage, Lead, LeadStatus};
use crate::model::RecordId;
use log::{info, warn};
use std::borrow::Cow;
use std::marker::PhantomData;
use std::sync::Arc;

/// A record a list screen can search.
pub trait Searchable {
    /// Entity name used in log lines.
    const ENTITY: &'static str;
    /// Exact-match filter offered next to the search box; `()` when none.
    type Facet: Copy + PartialEq;

    fn id(&self) -> RecordId;
    /// Text fields the search box looks at.
    fn search_fields(&self) -> Vec<Cow<'_, str>>;
    fn facet(&self) -> Self::Facet;
}

/// Search box text plus an optional facet ("All" when `None`).
#[derive(Debug, Clone, PartialEq)]
pub struct SearchFilter<F> {
    pub text: String,
    pub facet: Option<F>,
}

impl<F> Default for SearchFilter<F> {
    fn default() -> Self {
        Self {
            text: String::new(),
            facet: None,
        }
    }
}

impl<F> SearchFilter<F> {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            facet: None,
        }
    }

    pub fn with_facet(mut self, facet: F) -> Self {
        self.facet = Some(facet);
        self
    }
}

/// Records of `records` accepted by `filter`, in input order.
pub fn filter_records<'a, R: Searchable>(
    records: &'a [R],
    filter: &SearchFilter<R::Facet>,
) -> Vec<&'a R> {
    let needle = filter.text.trim().to_lowercase();
    records
        .iter()
        .filter(|record| match filter.facet {
            Some(facet) => record.facet() == facet,
            None => true,
        })
        .filter(|record| {
            needle.is_empty()
                || record
                    .search_fields()
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Screen service for one entity type.
pub struct EntityService<R, B> {
    backend: Arc<B>,
    _record: PhantomData<fn() -> R>,
}

impl<R, B> EntityService<R, B>
where
    R: Searchable + Clone,
    B: EntityApi<R>,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self {
            backend,
            _record: PhantomData,
        }
    }

    /// All records, newest first.
    pub fn list(&self) -> ServiceResult<Vec<R>> {
        let records = self.backend.list_records().map_err(|err| {
            warn!(
                "event=entity_list module=service entity={} status=error error_code={} error={err}",
                R::ENTITY,
                err.code()
            );
            err
        })?;
        Ok(records)
    }

    pub fn get(&self, id: RecordId) -> ServiceResult<Option<R>> {
        Ok(self.backend.get_record(id)?)
    }

    pub fn search(&self, filter: &SearchFilter<R::Facet>) -> ServiceResult<Vec<R>> {
        let records = self.list()?;
        Ok(filter_records(&records, filter)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn create(&self, record: &R) -> ServiceResult<R> {
        let created = self.backend.create_record(record)?;
        info!(
            "event=entity_create module=service entity={} status=ok id={}",
            R::ENTITY,
            created.id()
        );
        Ok(created)
    }

    pub fn update(&self, record: &R) -> ServiceResult<R> {
        let updated = self.backend.update_record(record)?;
        info!(
            "event=entity_update module=service entity={} status=ok id={}",
            R::ENTITY,
            updated.id()
        );
        Ok(updated)
    }

    pub fn delete(&self, id: RecordId) -> ServiceResult<()> {
        self.backend.delete_record(id)?;
        info!(
            "event=entity_delete module=service entity={} status=ok id={id}",
            R::ENTITY
        );
        Ok(())
    }
}

impl<B: EntityApi<Task>> EntityService<Task, B> {
    /// "Mark as completed" action of the task list.
    pub fn complete(&self, task: &Task) -> ServiceResult<Task> {
        let mut completed = task.clone();
        completed.status = TaskStatus::Completed;
        self.update(&completed)
    }
}

impl Searchable for Lead {
    const ENTITY: &'static str = "lead";
    type Facet = LeadStatus;

    fn id(&self) -> RecordId {
        self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        let mut fields = vec![Cow::Borrowed(self.name.as_str()), Cow::Borrowed(self.email.as_str())];
        if let Some(company) = &self.company {
            fields.push(Cow::Borrowed(company.as_str()));
        }
        fields
    }

    fn facet(&self) -> LeadStatus {
        self.status
    }
}

impl Searchable for Contact {
    const ENTITY: &'static str = "contact";
    type Facet = ();

    fn id(&self) -> RecordId {
        self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Owned(self.full_name()), Cow::Borrowed(self.email.as_str())]
    }

    fn facet(&self) {}
}

impl Searchable for Account {
    const ENTITY: &'static str = "account";
    type Facet = ();

    fn id(&self) -> RecordId {
        self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        let mut fields = vec![Cow::Borrowed(self.name.as_str())];
        if let Some(industry) = &self.industry {
            fields.push(Cow::Borrowed(industry.as_str()));
        }
        fields
    }

    fn facet(&self) {}
}

impl Searchable for Deal {
    const ENTITY: &'static str = "deal";
    type Facet = DealStage;

    fn id(&self) -> RecordId {
        self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Borrowed(self.title.as_str())]
    }

    fn facet(&self) -> DealStage {
        self.stage
    }
}

impl Searchable for Task {
    const ENTITY: &'static str = "task";
    type Facet = TaskStatus;

    fn id(&self) -> RecordId {
        self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Borrowed(self.title.as_str())]
    }

    fn facet(&self) -> TaskStatus {
        self.status
    }
}

impl Searchable for Communication {
    const ENTITY: &'static str = "communication";
    type Facet = CommunicationKind;

    fn id(&self) -> RecordId {
        self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![
            Cow::Borrowed(self.subject.as_str()),
            Cow::Borrowed(self.content.as_str()),
        ]
    }

    fn facet(&self) -> CommunicationKind {
        self.kind
    }
}

impl Searchable for Campaign {
    const ENTITY: &'static str = "campaign";
    type Facet = ();

    fn id(&self) -> RecordId {
        self.id
    }

    fn search_fields(&self) -> Vec<Cow<'_, str>> {
        vec![Cow::Borrowed(self.name.as_str())]
    }

    fn facet(&self) {}
}
