//! Dashboard and report aggregates.
//!
//! # Invariants
//! - Status and stage distributions follow declaration order and drop empty
//!   buckets.
//! - Monthly sales count Closed Won deals by expected close month, in
//!   calendar order, listing only months that have revenue.
//! - Ratios are 0 when their denominator is empty.

use super::ServiceResult;
use crate::backend::EntityApi;
use crate::model::activity::Task;
use crate::model::campaign::{Campaign, CampaignStatus};
use crate::model::month_of;
use crate::model::sales::{Deal, DealStage, Lead, LeadStatus};
use serde::Serialize;
use std::sync::Arc;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedCount {
    pub name: String,
    pub value: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySales {
    pub month: &'static str,
    pub revenue: f64,
    pub deals: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardKpis {
    pub total_leads: usize,
    pub qualified_leads: usize,
    pub total_deals: usize,
    /// Sum of every deal's value, closed or not.
    pub pipeline_value: f64,
    /// Pending plus in-progress tasks.
    pub pending_tasks: usize,
}

/// Header cards of the deals screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealSummary {
    pub total_value: f64,
    pub won_value: f64,
    pub open_deals: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampaignSummary {
    pub total_campaigns: usize,
    pub active_campaigns: usize,
    pub total_leads_generated: u64,
    pub total_budget: f64,
    pub average_conversion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalesReport {
    pub won_revenue: f64,
    /// Won deals per lead, in percent.
    pub conversion_rate: f64,
    pub monthly: Vec<MonthlySales>,
    pub leads_by_source: Vec<NamedCount>,
    pub leads_by_status: Vec<NamedCount>,
    pub deals_by_stage: Vec<NamedCount>,
}

pub fn dashboard_kpis(leads: &[Lead], deals: &[Deal], tasks: &[Task]) -> DashboardKpis {
    DashboardKpis {
        total_leads: leads.len(),
        qualified_leads: leads
            .iter()
            .filter(|lead| lead.status == LeadStatus::Qualified)
            .count(),
        total_deals: deals.len(),
        pipeline_value: deals.iter().map(|deal| deal.value).sum(),
        pending_tasks: tasks.iter().filter(|task| task.status.is_open()).count(),
    }
}

pub fn lead_status_distribution(leads: &[Lead]) -> Vec<NamedCount> {
    distribution(LeadStatus::ALL, |status| {
        leads.iter().filter(|lead| lead.status == status).count()
    })
}

pub fn deal_stage_distribution(deals: &[Deal]) -> Vec<NamedCount> {
    distribution(DealStage::ALL, |stage| {
        deals.iter().filter(|deal| deal.stage == stage).count()
    })
}

fn distribution<T: Copy + std::fmt::Display>(
    buckets: &[T],
    count: impl Fn(T) -> usize,
) -> Vec<NamedCount> {
    buckets
        .iter()
        .map(|bucket| NamedCount {
            name: bucket.to_string(),
            value: count(*bucket),
        })
        .filter(|entry| entry.value > 0)
        .collect()
}

/// Lead counts per source, in order of first appearance.
pub fn leads_by_source(leads: &[Lead]) -> Vec<NamedCount> {
    let mut counts: Vec<NamedCount> = Vec::new();
    for lead in leads {
        match counts.iter_mut().find(|entry| entry.name == lead.source) {
            Some(entry) => entry.value += 1,
            None => counts.push(NamedCount {
                name: lead.source.clone(),
                value: 1,
            }),
        }
    }
    counts
}

/// Closed Won revenue and deal count per expected close month.
///
/// Deals whose close date does not parse are skipped.
pub fn monthly_sales(deals: &[Deal]) -> Vec<MonthlySales> {
    let mut buckets = [(0.0_f64, 0_usize); 12];
    for deal in deals.iter().filter(|deal| deal.stage == DealStage::ClosedWon) {
        if let Some(month) = month_of(&deal.expected_close_date) {
            let (revenue, count) = &mut buckets[(month - 1) as usize];
            *revenue += deal.value;
            *count += 1;
        }
    }
    MONTHS
        .iter()
        .zip(buckets)
        .filter(|(_, (_, count))| *count > 0)
        .map(|(month, (revenue, deals))| MonthlySales {
            month: *month,
            revenue,
            deals,
        })
        .collect()
}

pub fn won_revenue(deals: &[Deal]) -> f64 {
    deals
        .iter()
        .filter(|deal| deal.stage == DealStage::ClosedWon)
        .map(|deal| deal.value)
        .sum()
}

/// Closed Won deals per lead, in percent; 0 without leads.
pub fn conversion_rate(leads: &[Lead], deals: &[Deal]) -> f64 {
    if leads.is_empty() {
        return 0.0;
    }
    let won = deals
        .iter()
        .filter(|deal| deal.stage == DealStage::ClosedWon)
        .count();
    won as f64 / leads.len() as f64 * 100.0
}

pub fn deal_summary(deals: &[Deal]) -> DealSummary {
    DealSummary {
        total_value: deals.iter().map(|deal| deal.value).sum(),
        won_value: won_revenue(deals),
        open_deals: deals.iter().filter(|deal| !deal.stage.is_closed()).count(),
    }
}

pub fn campaign_summary(campaigns: &[Campaign]) -> CampaignSummary {
    let average_conversion_rate = if campaigns.is_empty() {
        0.0
    } else {
        campaigns
            .iter()
            .map(|campaign| campaign.conversion_rate)
            .sum::<f64>()
            / campaigns.len() as f64
    };
    CampaignSummary {
        total_campaigns: campaigns.len(),
        active_campaigns: campaigns
            .iter()
            .filter(|campaign| campaign.status == CampaignStatus::Active)
            .count(),
        total_leads_generated: campaigns
            .iter()
            .map(|campaign| u64::from(campaign.leads_generated))
            .sum(),
        total_budget: campaigns
            .iter()
            .filter_map(|campaign| campaign.budget)
            .sum(),
        average_conversion_rate,
    }
}

/// Fetches the tables a report needs and aggregates them.
pub struct ReportService<B> {
    backend: Arc<B>,
}

impl<B> ReportService<B>
where
    B: EntityApi<Lead> + EntityApi<Deal> + EntityApi<Task> + EntityApi<Campaign>,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub fn dashboard(&self) -> ServiceResult<DashboardKpis> {
        let leads = self.fetch::<Lead>()?;
        let deals = self.fetch::<Deal>()?;
        let tasks = self.fetch::<Task>()?;
        Ok(dashboard_kpis(&leads, &deals, &tasks))
    }

    pub fn sales(&self) -> ServiceResult<SalesReport> {
        let leads = self.fetch::<Lead>()?;
        let deals = self.fetch::<Deal>()?;
        Ok(SalesReport {
            won_revenue: won_revenue(&deals),
            conversion_rate: conversion_rate(&leads, &deals),
            monthly: monthly_sales(&deals),
            leads_by_source: leads_by_source(&leads),
            leads_by_status: lead_status_distribution(&leads),
            deals_by_stage: deal_stage_distribution(&deals),
        })
    }

    pub fn deals(&self) -> ServiceResult<DealSummary> {
        Ok(deal_summary(&self.fetch::<Deal>()?))
    }

    pub fn campaigns(&self) -> ServiceResult<CampaignSummary> {
        Ok(campaign_summary(&self.fetch::<Campaign>()?))
    }

    fn fetch<R>(&self) -> ServiceResult<Vec<R>>
    where
        B: EntityApi<R>,
    {
        Ok(<B as EntityApi<R>>::list_records(self.backend.as_ref())?)
    }
}
