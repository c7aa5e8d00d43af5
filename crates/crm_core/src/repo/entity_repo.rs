//! Column mappings for the CRM entity tables.

use super::error::{RepoError, RepoResult};
use super::record::{
    id_value, opt_id_value, opt_int_value, opt_real_value, opt_text_value, read_id, read_label,
    read_opt_id, text_value, TableRecord,
};
use crate::model::activity::{
    Communication, CommunicationKind, RelatedTo, RelatedType, Task, TaskKind, TaskPriority,
    TaskStatus,
};
use crate::model::campaign::{Campaign, CampaignStatus};
use crate::model::sales::{Account, Contact, Deal, DealStage, Lead, LeadStatus};
use crate::model::{RecordId, ValidationError};
use rusqlite::types::Value;
use rusqlite::Row;

impl TableRecord for Lead {
    const TABLE: &'static str = "leads";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "email",
        "phone",
        "company",
        "status",
        "source",
        "assigned_to",
        "value",
        "notes",
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Lead::validate(self)
    }

    fn bind_values(&self) -> Vec<Value> {
        vec![
            text_value(&self.name),
            text_value(self.email.trim()),
            opt_text_value(self.phone.as_deref()),
            opt_text_value(self.company.as_deref()),
            text_value(self.status.as_str()),
            text_value(&self.source),
            opt_id_value(self.assigned_to),
            opt_real_value(self.value),
            opt_text_value(self.notes.as_deref()),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: read_id(row, "id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            company: row.get("company")?,
            status: read_label(row, "status", LeadStatus::parse)?,
            source: row.get("source")?,
            assigned_to: read_opt_id(row, "assigned_to")?,
            value: row.get("value")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl TableRecord for Contact {
    const TABLE: &'static str = "contacts";
    const COLUMNS: &'static [&'static str] = &[
        "first_name",
        "last_name",
        "email",
        "phone",
        "account_id",
        "position",
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Contact::validate(self)
    }

    fn bind_values(&self) -> Vec<Value> {
        vec![
            text_value(&self.first_name),
            text_value(&self.last_name),
            text_value(self.email.trim()),
            opt_text_value(self.phone.as_deref()),
            opt_id_value(self.account_id),
            opt_text_value(self.position.as_deref()),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: read_id(row, "id")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            email: row.get("email")?,
            phone: row.get("phone")?,
            account_id: read_opt_id(row, "account_id")?,
            position: row.get("position")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl TableRecord for Account {
    const TABLE: &'static str = "accounts";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "industry",
        "website",
        "phone",
        "address",
        "employees",
        "annual_revenue",
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Account::validate(self)
    }

    fn bind_values(&self) -> Vec<Value> {
        vec![
            text_value(&self.name),
            opt_text_value(self.industry.as_deref()),
            opt_text_value(self.website.as_deref()),
            opt_text_value(self.phone.as_deref()),
            opt_text_value(self.address.as_deref()),
            opt_int_value(self.employees.map(i64::from)),
            opt_real_value(self.annual_revenue),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let employees: Option<i64> = row.get("employees")?;
        let employees = employees
            .map(|count| {
                u32::try_from(count).map_err(|_| {
                    RepoError::InvalidData(format!("invalid employee count {count} in accounts"))
                })
            })
            .transpose()?;

        Ok(Self {
            id: read_id(row, "id")?,
            name: row.get("name")?,
            industry: row.get("industry")?,
            website: row.get("website")?,
            phone: row.get("phone")?,
            address: row.get("address")?,
            employees,
            annual_revenue: row.get("annual_revenue")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl TableRecord for Deal {
    const TABLE: &'static str = "deals";
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "account_id",
        "contact_id",
        "value",
        "stage",
        "probability",
        "expected_close_date",
        "assigned_to",
        "notes",
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Deal::validate(self)
    }

    fn bind_values(&self) -> Vec<Value> {
        vec![
            text_value(&self.title),
            opt_id_value(self.account_id),
            opt_id_value(self.contact_id),
            Value::Real(self.value),
            text_value(self.stage.as_str()),
            Value::Integer(i64::from(self.probability)),
            text_value(&self.expected_close_date),
            opt_id_value(self.assigned_to),
            opt_text_value(self.notes.as_deref()),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let probability: i64 = row.get("probability")?;
        let probability = u8::try_from(probability)
            .ok()
            .filter(|value| *value <= 100)
            .ok_or_else(|| {
                RepoError::InvalidData(format!("invalid probability {probability} in deals"))
            })?;

        Ok(Self {
            id: read_id(row, "id")?,
            title: row.get("title")?,
            account_id: read_opt_id(row, "account_id")?,
            contact_id: read_opt_id(row, "contact_id")?,
            value: row.get("value")?,
            stage: read_label(row, "stage", DealStage::parse)?,
            probability,
            expected_close_date: row.get("expected_close_date")?,
            assigned_to: read_opt_id(row, "assigned_to")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

fn related_values(related_to: Option<&RelatedTo>) -> [Value; 2] {
    match related_to {
        Some(link) => [text_value(link.kind.as_str()), id_value(link.id)],
        None => [Value::Null, Value::Null],
    }
}

fn read_related(row: &Row<'_>) -> RepoResult<Option<RelatedTo>> {
    let kind: Option<String> = row.get("related_to_type")?;
    let id = read_opt_id(row, "related_to_id")?;
    match (kind, id) {
        (Some(kind), Some(id)) => {
            let kind = RelatedType::parse(&kind).ok_or_else(|| {
                RepoError::InvalidData(format!("unknown `{kind}` in related_to_type"))
            })?;
            Ok(Some(RelatedTo { kind, id }))
        }
        (None, None) => Ok(None),
        _ => Err(RepoError::InvalidData(
            "related_to_type and related_to_id must be set together".to_string(),
        )),
    }
}

impl TableRecord for Task {
    const TABLE: &'static str = "tasks";
    const COLUMNS: &'static [&'static str] = &[
        "title",
        "description",
        "type",
        "priority",
        "due_date",
        "assigned_to",
        "related_to_type",
        "related_to_id",
        "status",
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Task::validate(self)
    }

    fn bind_values(&self) -> Vec<Value> {
        let [related_type, related_id] = related_values(self.related_to.as_ref());
        vec![
            text_value(&self.title),
            opt_text_value(self.description.as_deref()),
            text_value(self.kind.as_str()),
            text_value(self.priority.as_str()),
            text_value(&self.due_date),
            opt_id_value(self.assigned_to),
            related_type,
            related_id,
            text_value(self.status.as_str()),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        Ok(Self {
            id: read_id(row, "id")?,
            title: row.get("title")?,
            description: row.get("description")?,
            kind: read_label(row, "type", TaskKind::parse)?,
            priority: read_label(row, "priority", TaskPriority::parse)?,
            due_date: row.get("due_date")?,
            assigned_to: read_opt_id(row, "assigned_to")?,
            related_to: read_related(row)?,
            status: read_label(row, "status", TaskStatus::parse)?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl TableRecord for Communication {
    const TABLE: &'static str = "communications";
    const COLUMNS: &'static [&'static str] = &[
        "type",
        "subject",
        "content",
        "related_to_type",
        "related_to_id",
        "created_by",
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Communication::validate(self)
    }

    fn bind_values(&self) -> Vec<Value> {
        let [related_type, related_id] = related_values(Some(&self.related_to));
        vec![
            text_value(self.kind.as_str()),
            text_value(&self.subject),
            text_value(&self.content),
            related_type,
            related_id,
            id_value(self.created_by),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let related_to = read_related(row)?.ok_or_else(|| {
            RepoError::InvalidData("communication without related record".to_string())
        })?;

        Ok(Self {
            id: read_id(row, "id")?,
            kind: read_label(row, "type", CommunicationKind::parse)?,
            subject: row.get("subject")?,
            content: row.get("content")?,
            related_to,
            created_by: read_id(row, "created_by")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl TableRecord for Campaign {
    const TABLE: &'static str = "campaigns";
    const COLUMNS: &'static [&'static str] = &[
        "name",
        "type",
        "status",
        "start_date",
        "end_date",
        "budget",
        "leads_generated",
        "conversion_rate",
    ];

    fn id(&self) -> RecordId {
        self.id
    }

    fn created_at(&self) -> i64 {
        self.created_at
    }

    fn validate(&self) -> Result<(), ValidationError> {
        Campaign::validate(self)
    }

    fn bind_values(&self) -> Vec<Value> {
        vec![
            text_value(&self.name),
            text_value(&self.kind),
            text_value(self.status.as_str()),
            text_value(&self.start_date),
            opt_text_value(self.end_date.as_deref()),
            opt_real_value(self.budget),
            Value::Integer(i64::from(self.leads_generated)),
            Value::Real(self.conversion_rate),
        ]
    }

    fn from_row(row: &Row<'_>) -> RepoResult<Self> {
        let leads_generated: i64 = row.get("leads_generated")?;
        let leads_generated = u32::try_from(leads_generated).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid leads_generated {leads_generated} in campaigns"
            ))
        })?;

        Ok(Self {
            id: read_id(row, "id")?,
            name: row.get("name")?,
            kind: row.get("type")?,
            status: read_label(row, "status", CampaignStatus::parse)?,
            start_date: row.get("start_date")?,
            end_date: row.get("end_date")?,
            budget: row.get("budget")?,
            leads_generated,
            conversion_rate: row.get("conversion_rate")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::record::SqliteTable;
    use crate::db::open_db_in_memory;
    use crate::model::activity::{RelatedTo, RelatedType, Task, TaskStatus};
    use crate::model::sales::{Account, Contact, Deal, DealStage, Lead, LeadStatus};
    use crate::repo::RepoError;
    use uuid::Uuid;

    #[test]
    fn lead_create_update_delete() {
        let conn = open_db_in_memory().expect("open db");
        let leads = SqliteTable::<Lead>::new(&conn);

        let mut lead = Lead::new("Grace Hopper", "grace@example.com", "Referral");
        lead.value = Some(12_500.0);
        let stored = leads.create(&lead).expect("create lead");
        assert!(stored.created_at > 0);
        assert_eq!(stored.value, Some(12_500.0));

        lead.status = LeadStatus::Qualified;
        let updated = leads.update(&lead).expect("update lead");
        assert_eq!(updated.status, LeadStatus::Qualified);

        leads.delete(lead.id).expect("delete lead");
        assert!(leads.get(lead.id).expect("get").is_none());
        assert!(matches!(leads.delete(lead.id), Err(RepoError::NotFound(id)) if id == lead.id));
    }

    #[test]
    fn invalid_records_never_reach_sql() {
        let conn = open_db_in_memory().expect("open db");
        let leads = SqliteTable::<Lead>::new(&conn);
        let lead = Lead::new("", "grace@example.com", "Referral");
        assert!(matches!(leads.create(&lead), Err(RepoError::Validation(_))));
        assert_eq!(leads.count().expect("count"), 0);
    }

    #[test]
    fn update_missing_row_is_not_found() {
        let conn = open_db_in_memory().expect("open db");
        let accounts = SqliteTable::<Account>::new(&conn);
        let account = Account::new("Initech");
        assert!(matches!(
            accounts.update(&account),
            Err(RepoError::NotFound(_))
        ));
    }

    #[test]
    fn list_is_newest_first() {
        let conn = open_db_in_memory().expect("open db");
        let deals = SqliteTable::<Deal>::new(&conn);

        let mut older = Deal::new("Older", 100.0, "2025-01-31");
        older.created_at = 1_000;
        let mut newer = Deal::new("Newer", 200.0, "2025-02-28");
        newer.created_at = 2_000;
        newer.stage = DealStage::ClosedWon;
        deals.create(&older).expect("create older");
        deals.create(&newer).expect("create newer");

        let titles: Vec<_> = deals
            .list()
            .expect("list")
            .into_iter()
            .map(|deal| deal.title)
            .collect();
        assert_eq!(titles, vec!["Newer", "Older"]);
    }

    #[test]
    fn task_related_link_round_trips_through_two_columns() {
        let conn = open_db_in_memory().expect("open db");
        let tasks = SqliteTable::<Task>::new(&conn);

        let mut task = Task::new("Prepare proposal", "2025-03-10");
        task.related_to = Some(RelatedTo {
            kind: RelatedType::Deal,
            id: Uuid::new_v4(),
        });
        task.status = TaskStatus::InProgress;
        let stored = tasks.create(&task).expect("create task");
        assert_eq!(stored.related_to, task.related_to);
        assert_eq!(stored.status, TaskStatus::InProgress);
    }

    #[test]
    fn contact_links_to_existing_account() {
        let conn = open_db_in_memory().expect("open db");
        let account = SqliteTable::<Account>::new(&conn)
            .create(&Account::new("Globex"))
            .expect("create account");

        let contacts = SqliteTable::<Contact>::new(&conn);
        let mut contact = Contact::new("Hank", "Scorpio", "hank@globex.example");
        contact.account_id = Some(account.id);
        let stored = contacts.create(&contact).expect("create contact");
        assert_eq!(stored.account_id, Some(account.id));

        contact.account_id = Some(Uuid::new_v4());
        assert!(contacts.update(&contact).is_err());
    }
}
