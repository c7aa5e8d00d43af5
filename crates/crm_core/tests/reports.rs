use crm_core::backend::{AuthApi, EntityApi, LocalBackend};
use crm_core::model::activity::{Task, TaskStatus};
use crm_core::model::campaign::{Campaign, CampaignStatus};
use crm_core::model::sales::{Deal, DealStage, Lead, LeadStatus};
use crm_core::service::{NamedCount, ReportService};
use std::sync::Arc;

fn seeded_backend() -> Arc<LocalBackend> {
    let backend = LocalBackend::open_in_memory().unwrap();
    backend
        .bootstrap_admin("root@example.com", "rootpass", "Root")
        .unwrap();
    backend
        .sign_in_with_password("root@example.com", "rootpass")
        .unwrap();

    let statuses = [
        LeadStatus::New,
        LeadStatus::Qualified,
        LeadStatus::Qualified,
        LeadStatus::Lost,
    ];
    for (index, status) in statuses.into_iter().enumerate() {
        let source = if index % 2 == 0 { "Website" } else { "Referral" };
        let mut lead = Lead::new(
            format!("Lead {index}"),
            format!("lead{index}@example.com"),
            source,
        );
        lead.status = status;
        EntityApi::<Lead>::create_record(&backend, &lead).unwrap();
    }

    let deals = [
        (DealStage::ClosedWon, 1_000.0, "2025-03-10"),
        (DealStage::ClosedWon, 500.0, "2024-03-28"),
        (DealStage::ClosedWon, 2_000.0, "2025-01-05"),
        (DealStage::Negotiation, 4_000.0, "2025-02-01"),
        (DealStage::ClosedLost, 300.0, "2025-02-01"),
    ];
    for (stage, value, close) in deals {
        let mut deal = Deal::new("Deal", value, close);
        deal.stage = stage;
        EntityApi::<Deal>::create_record(&backend, &deal).unwrap();
    }

    for status in [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Completed] {
        let mut task = Task::new("Follow up", "2025-04-01");
        task.status = status;
        EntityApi::<Task>::create_record(&backend, &task).unwrap();
    }

    let mut spring = Campaign::new("Spring promo", "Email", "2025-03-01");
    spring.status = CampaignStatus::Active;
    spring.budget = Some(1_500.0);
    spring.leads_generated = 30;
    spring.conversion_rate = 12.5;
    EntityApi::<Campaign>::create_record(&backend, &spring).unwrap();
    let mut webinar = Campaign::new("Webinar", "Webinar", "2025-05-01");
    webinar.leads_generated = 10;
    webinar.conversion_rate = 7.5;
    EntityApi::<Campaign>::create_record(&backend, &webinar).unwrap();

    Arc::new(backend)
}

fn named(name: &str, value: usize) -> NamedCount {
    NamedCount {
        name: name.to_string(),
        value,
    }
}

#[test]
fn dashboard_kpis_over_stored_records() {
    let reports = ReportService::new(seeded_backend());
    let kpis = reports.dashboard().unwrap();
    assert_eq!(kpis.total_leads, 4);
    assert_eq!(kpis.qualified_leads, 2);
    assert_eq!(kpis.total_deals, 5);
    assert_eq!(kpis.pipeline_value, 7_800.0);
    assert_eq!(kpis.pending_tasks, 2);
}

#[test]
fn sales_report_aggregates() {
    let reports = ReportService::new(seeded_backend());
    let sales = reports.sales().unwrap();

    assert_eq!(sales.won_revenue, 3_500.0);
    assert_eq!(sales.conversion_rate, 75.0);

    let months: Vec<_> = sales
        .monthly
        .iter()
        .map(|entry| (entry.month, entry.revenue, entry.deals))
        .collect();
    assert_eq!(months, vec![("Jan", 2_000.0, 1), ("Mar", 1_500.0, 2)]);

    let mut sources = sales.leads_by_source.clone();
    sources.sort_by(|a, b| a.name.cmp(&b.name));
    assert_eq!(sources, vec![named("Referral", 2), named("Website", 2)]);

    assert_eq!(
        sales.leads_by_status,
        vec![named("New", 1), named("Qualified", 2), named("Lost", 1)]
    );
    assert_eq!(
        sales.deals_by_stage,
        vec![
            named("Negotiation", 1),
            named("Closed Won", 3),
            named("Closed Lost", 1)
        ]
    );
}

#[test]
fn deal_and_campaign_headers() {
    let reports = ReportService::new(seeded_backend());

    let deals = reports.deals().unwrap();
    assert_eq!(deals.total_value, 7_800.0);
    assert_eq!(deals.won_value, 3_500.0);
    assert_eq!(deals.open_deals, 1);

    let campaigns = reports.campaigns().unwrap();
    assert_eq!(campaigns.total_campaigns, 2);
    assert_eq!(campaigns.active_campaigns, 1);
    assert_eq!(campaigns.total_leads_generated, 40);
    assert_eq!(campaigns.total_budget, 1_500.0);
    assert_eq!(campaigns.average_conversion_rate, 10.0);
}

#[test]
fn empty_tables_report_zeroes() {
    let backend = LocalBackend::open_in_memory().unwrap();
    backend.sign_up("solo@example.com", "solopass").unwrap();
    let reports = ReportService::new(Arc::new(backend));

    let sales = reports.sales().unwrap();
    assert_eq!(sales.conversion_rate, 0.0);
    assert!(sales.monthly.is_empty());
    assert!(sales.leads_by_status.is_empty());
    assert_eq!(reports.campaigns().unwrap().average_conversion_rate, 0.0);
}

#[test]
fn reports_need_a_session() {
    let backend = seeded_backend();
    backend.sign_out().unwrap();
    let reports = ReportService::new(backend);
    assert!(reports.dashboard().is_err());
}
