//! Applies verified Stripe events to the stored profile.
//!
//! Every transition is a plain overwrite of the matched profile's fields, so
//! redelivered events converge to the same row.

use chrono::{DateTime, Utc};
use common::{Plan, SubscriptionStatus};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set,
    TransactionSession, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use super::BillingError;
use super::event::{CheckoutSession, Event, Invoice, Subscription};
use crate::config::StripeConfig;
use crate::entity::{profile, project};

/// What the synchronizer did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The profile was updated.
    Applied { profile_id: Uuid },
    /// No profile matches the event's customer/subscription/user.
    ProfileNotFound,
    /// Event type the app does not react to, or a stale event.
    Ignored,
}

/// Owner of a checkout: the first of `metadata.user_id` and
/// `client_reference_id` that holds a valid user id.
fn checkout_user(session: &CheckoutSession) -> Option<Uuid> {
    session
        .metadata
        .get("user_id")
        .map(String::as_str)
        .into_iter()
        .chain(session.client_reference_id.as_deref())
        .find_map(|raw| Uuid::parse_str(raw.trim()).ok())
}

pub struct PlanSynchronizer<'a, C: ConnectionTrait + TransactionTrait> {
    conn: &'a C,
    stripe: &'a StripeConfig,
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

impl<'a, C: ConnectionTrait + TransactionTrait> PlanSynchronizer<'a, C> {
    pub fn new(conn: &'a C, stripe: &'a StripeConfig) -> Self {
        Self { conn, stripe }
    }

    /// Plan to store given the current one and the price an event carries.
    ///
    /// A missing or unmapped price never changes the stored plan.
    pub fn resolve_plan(&self, current: &str, price_id: Option<&str>) -> String {
        match price_id {
            Some(price) => match self.stripe.plan_for_price(price) {
                Some(plan) => plan.as_str().to_string(),
                None => {
                    warn!(
                        price_id = price,
                        current_plan = current,
                        "Unknown price id, keeping previous plan"
                    );
                    current.to_string()
                }
            },
            None => {
                warn!(current_plan = current, "Event has no price id, keeping previous plan");
                current.to_string()
            }
        }
    }

    pub async fn apply(&self, event: Event) -> Result<SyncOutcome, BillingError> {
        let object = event.data.object;
        match event.event_type.as_str() {
            "checkout.session.completed" => {
                self.checkout_completed(serde_json::from_value(object)?)
                    .await
            }
            "customer.subscription.created" | "customer.subscription.updated" => {
                self.subscription_updated(serde_json::from_value(object)?)
                    .await
            }
            "invoice.paid" | "invoice.payment_succeeded" => {
                self.invoice_paid(serde_json::from_value(object)?).await
            }
            "customer.subscription.deleted" => {
                self.subscription_deleted(serde_json::from_value(object)?)
                    .await
            }
            other => {
                info!(event_id = %event.id, event_type = other, "Ignoring Stripe event");
                Ok(SyncOutcome::Ignored)
            }
        }
    }

    async fn find_by_customer(
        &self,
        customer: Option<&str>,
        subscription: Option<&str>,
    ) -> Result<Option<profile::Model>, BillingError> {
        if let Some(customer) = customer {
            let found = profile::Entity::find()
                .filter(profile::Column::StripeCustomerId.eq(customer))
                .one(self.conn)
                .await?;
            if found.is_some() {
                return Ok(found);
            }
        }
        if let Some(subscription) = subscription {
            return Ok(profile::Entity::find()
                .filter(profile::Column::StripeSubscriptionId.eq(subscription))
                .one(self.conn)
                .await?);
        }
        Ok(None)
    }

    async fn checkout_completed(
        &self,
        session: CheckoutSession,
    ) -> Result<SyncOutcome, BillingError> {
        let Some(user_id) = checkout_user(&session) else {
            warn!(session_id = %session.id, "Checkout session without a user reference");
            return Ok(SyncOutcome::ProfileNotFound);
        };

        let txn = self.conn.begin().await?;

        let Some(existing) = profile::Entity::find_by_id(user_id).one(&txn).await? else {
            warn!(session_id = %session.id, %user_id, "Checkout completed for unknown profile");
            return Ok(SyncOutcome::ProfileNotFound);
        };

        let plan = self.resolve_plan(
            &existing.plan_activo,
            session.metadata.get("price_id").map(String::as_str),
        );

        let mut active: profile::ActiveModel = existing.into();
        if let Some(customer) = session.customer.clone() {
            active.stripe_customer_id = Set(Some(customer));
        }
        if let Some(subscription) = session.subscription.clone() {
            active.stripe_subscription_id = Set(Some(subscription));
        }
        active.subscription_status = Set(Some(SubscriptionStatus::Active));
        active.plan_activo = Set(plan.clone());
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;

        if let Some(project_id) = session
            .metadata
            .get("project_id")
            .and_then(|raw| raw.parse::<i32>().ok())
        {
            let result = project::Entity::update_many()
                .col_expr(project::Column::IsPaid, Expr::value(true))
                .col_expr(project::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(project::Column::Id.eq(project_id))
                .filter(project::Column::UserId.eq(user_id))
                .exec(&txn)
                .await?;
            if result.rows_affected == 0 {
                warn!(
                    project_id,
                    %user_id,
                    "Paid checkout references a foreign or missing project"
                );
            }
        }

        txn.commit().await?;

        info!(session_id = %session.id, %user_id, plan = %plan, "Checkout completed");
        Ok(SyncOutcome::Applied {
            profile_id: user_id,
        })
    }

    async fn subscription_updated(&self, sub: Subscription) -> Result<SyncOutcome, BillingError> {
        let Some(existing) = self
            .find_by_customer(Some(&sub.customer), Some(&sub.id))
            .await?
        else {
            warn!(
                subscription_id = %sub.id,
                customer = %sub.customer,
                "Subscription update for unknown customer"
            );
            return Ok(SyncOutcome::ProfileNotFound);
        };
        let profile_id = existing.id;

        let plan = self.resolve_plan(&existing.plan_activo, sub.price_id());
        let status = match sub.status.parse::<SubscriptionStatus>() {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(error = %e, "Keeping previous subscription status");
                existing.subscription_status
            }
        };
        let period_end = sub
            .period_end()
            .and_then(timestamp)
            .or(existing.subscription_period_end);

        let mut active: profile::ActiveModel = existing.into();
        active.stripe_customer_id = Set(Some(sub.customer.clone()));
        active.stripe_subscription_id = Set(Some(sub.id.clone()));
        active.subscription_status = Set(status);
        active.subscription_period_end = Set(period_end);
        active.plan_activo = Set(plan.clone());
        active.updated_at = Set(Utc::now());
        active.update(self.conn).await?;

        info!(
            %profile_id,
            subscription_id = %sub.id,
            status = %sub.status,
            plan = %plan,
            "Subscription synced"
        );
        Ok(SyncOutcome::Applied { profile_id })
    }

    async fn invoice_paid(&self, invoice: Invoice) -> Result<SyncOutcome, BillingError> {
        let Some(existing) = self
            .find_by_customer(invoice.customer.as_deref(), invoice.subscription_id())
            .await?
        else {
            warn!(invoice_id = %invoice.id, "Paid invoice for unknown customer");
            return Ok(SyncOutcome::ProfileNotFound);
        };
        let profile_id = existing.id;

        let paid_through = invoice.paid_through().and_then(timestamp);
        // Never move the period end backwards when invoices arrive out of order.
        let period_end = match (existing.subscription_period_end, paid_through) {
            (Some(current), Some(new)) => Some(current.max(new)),
            (current, new) => new.or(current),
        };

        let mut active: profile::ActiveModel = existing.into();
        if let Some(subscription) = invoice.subscription_id() {
            active.stripe_subscription_id = Set(Some(subscription.to_string()));
        }
        active.subscription_status = Set(Some(SubscriptionStatus::Active));
        active.subscription_period_end = Set(period_end);
        active.updated_at = Set(Utc::now());
        active.update(self.conn).await?;

        info!(%profile_id, invoice_id = %invoice.id, ?period_end, "Invoice paid, period extended");
        Ok(SyncOutcome::Applied { profile_id })
    }

    async fn subscription_deleted(&self, sub: Subscription) -> Result<SyncOutcome, BillingError> {
        let Some(existing) = self
            .find_by_customer(Some(&sub.customer), Some(&sub.id))
            .await?
        else {
            warn!(subscription_id = %sub.id, "Deleted subscription for unknown customer");
            return Ok(SyncOutcome::ProfileNotFound);
        };

        // An old subscription ending must not cancel a newer one.
        if let Some(current) = existing.stripe_subscription_id.as_deref()
            && current != sub.id
        {
            info!(
                subscription_id = %sub.id,
                current_subscription = current,
                "Ignoring deletion of a superseded subscription"
            );
            return Ok(SyncOutcome::Ignored);
        }
        let profile_id = existing.id;

        let mut active: profile::ActiveModel = existing.into();
        active.plan_activo = Set(Plan::Free.as_str().to_string());
        active.subscription_status = Set(Some(SubscriptionStatus::Canceled));
        active.stripe_subscription_id = Set(None);
        active.updated_at = Set(Utc::now());
        active.update(self.conn).await?;

        info!(%profile_id, subscription_id = %sub.id, "Subscription deleted, downgraded to free");
        Ok(SyncOutcome::Applied { profile_id })
    }
}
