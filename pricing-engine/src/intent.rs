//! Draft validation and order intent construction

use chrono::NaiveDate;
use common::model::order::Order;
use common::points::{Points, PricePerUnit, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculator::{self, BalanceCheck};
use crate::delta::{self, ModificationDelta};

/// Raw form state for an order, offer acceptance, or order modification
///
/// Fields hold exactly what the user typed; validation trims and parses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderDraft {
    /// Quantity exactly as entered, possibly empty or non-numeric
    pub quantity: String,
    /// Delivery address
    pub delivery_address: String,
    /// Agreed delivery date
    pub delivery_date: Option<NaiveDate>,
    /// Further acceptable delivery dates (offer acceptance only)
    pub additional_dates: Vec<NaiveDate>,
    /// Free-text delivery instructions
    pub instructions: Option<String>,
}

/// Listing or offer context a draft is validated against
#[derive(Debug, Clone)]
pub struct DraftContext {
    /// Price in points per unit from the listing or offer acted on
    pub price_per_unit: PricePerUnit,
    /// Quantity cap; None for uncapped listings
    pub max_available: Option<Quantity>,
    /// Unit used when formatting the cap in rejection messages
    pub unit: String,
    /// The buyer's current available points
    pub current_balance: Points,
    /// Validation date; the delivery date must not be before it
    pub today: NaiveDate,
}

/// Immutable, validated order intent ready for submission
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderIntent {
    /// Positive, cap-respecting quantity
    pub quantity: Quantity,
    /// Price in points per unit
    pub price_per_unit: PricePerUnit,
    /// Rounded total price in whole points
    pub total_price: Points,
    /// Trimmed, non-empty delivery address
    pub delivery_address: String,
    /// Delivery date, today or later
    pub delivery_date: NaiveDate,
    /// Further acceptable delivery dates
    pub additional_dates: Vec<NaiveDate>,
    /// Free-text delivery instructions
    pub instructions: Option<String>,
}

/// A successfully built intent together with its balance check
#[derive(Debug, Clone)]
pub struct BuiltIntent {
    /// The validated intent
    pub intent: OrderIntent,
    /// Balance check for the amount this submission would charge
    pub balance: BalanceCheck,
    /// Escrow delta; present only in the modification flow
    pub delta: Option<ModificationDelta>,
}

/// Required draft fields, reported when absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DraftField {
    Quantity,
    DeliveryAddress,
    DeliveryDate,
}

impl DraftField {
    /// Field name for messages
    pub fn name(&self) -> &'static str {
        match self {
            DraftField::Quantity => "quantity",
            DraftField::DeliveryAddress => "delivery address",
            DraftField::DeliveryDate => "delivery date",
        }
    }
}

/// Why a draft was rejected
///
/// These are kinds, not exceptions: every rejection is resolved inline by
/// the hosting form and never crosses into a remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildRejection {
    /// One or more required fields are absent or unusable
    #[error("missing required fields")]
    MissingRequiredFields(Vec<DraftField>),

    /// Quantity is greater than the listing's or offer's cap
    #[error("only {max} {unit} available")]
    ExceedsAvailableQuantity { max: Quantity, unit: String },

    /// The charged amount exceeds the current balance; recoverable by
    /// buying the shortfall in points and re-validating the same draft
    #[error("{shortfall} more points needed")]
    InsufficientBalance { shortfall: Points },

    /// Modification flow only: nothing differs from the existing order
    #[error("no changes to apply")]
    NoChanges,
}

impl BuildRejection {
    /// Stable machine code for clients
    pub fn code(&self) -> &'static str {
        match self {
            BuildRejection::MissingRequiredFields(_) => "missing_required_fields",
            BuildRejection::ExceedsAvailableQuantity { .. } => "exceeds_available_quantity",
            BuildRejection::InsufficientBalance { .. } => "insufficient_balance",
            BuildRejection::NoChanges => "no_changes",
        }
    }

    /// True for the one kind recoverable within the same flow (via the
    /// points top-up detour)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BuildRejection::InsufficientBalance { .. })
    }
}

/// Validates a draft and produces either a complete intent or a rejection
pub struct OrderIntentBuilder<'a> {
    context: DraftContext,
    existing: Option<&'a Order>,
}

impl<'a> OrderIntentBuilder<'a> {
    /// Builder for the order-creation and offer-acceptance flows
    pub fn new(context: DraftContext) -> Self {
        Self { context, existing: None }
    }

    /// Builder for the modification flow
    ///
    /// The balance check covers only the escrow delta's additional cost,
    /// and a draft identical to the existing order is rejected.
    pub fn modifying(context: DraftContext, existing: &'a Order) -> Self {
        Self { context, existing: Some(existing) }
    }

    /// Validate the draft
    ///
    /// Rules run in order, stopping at the first failing class; all
    /// missing required fields are collected together. Unparsable
    /// quantity text coerces to zero and is reported as missing, the same
    /// as an empty field.
    pub fn build(&self, draft: &OrderDraft) -> Result<BuiltIntent, BuildRejection> {
        // 1. Required fields
        let mut missing = Vec::new();

        let quantity = calculator::parse_quantity(&draft.quantity);
        if quantity <= Decimal::ZERO {
            missing.push(DraftField::Quantity);
        }

        let address = draft.delivery_address.trim();
        if address.is_empty() {
            missing.push(DraftField::DeliveryAddress);
        }

        let delivery_date = match draft.delivery_date {
            Some(date) if date >= self.context.today => Some(date),
            _ => {
                missing.push(DraftField::DeliveryDate);
                None
            }
        };

        if !missing.is_empty() {
            return Err(BuildRejection::MissingRequiredFields(missing));
        }
        let delivery_date = match delivery_date {
            Some(date) => date,
            None => return Err(BuildRejection::MissingRequiredFields(vec![DraftField::DeliveryDate])),
        };

        // 2. Quantity cap
        if let Some(max) = self.context.max_available {
            if quantity > max {
                return Err(BuildRejection::ExceedsAvailableQuantity {
                    max,
                    unit: self.context.unit.clone(),
                });
            }
        }

        // 3. Balance sufficiency; modifications charge only the delta
        let total_price = calculator::compute_total(quantity, self.context.price_per_unit);
        let delta = self.existing.map(|order| delta::compute_delta(order, quantity));
        let charged = delta.as_ref().map_or(total_price, |d| d.additional_cost);
        let balance = calculator::compute_balance_check(self.context.current_balance, charged);
        if !balance.is_sufficient {
            return Err(BuildRejection::InsufficientBalance { shortfall: balance.shortfall });
        }

        // 4. Modification no-op guard
        if let Some(order) = self.existing {
            if quantity == order.quantity
                && address == order.delivery_address
                && delivery_date == order.delivery_date
                && draft.instructions == order.instructions
            {
                return Err(BuildRejection::NoChanges);
            }
        }

        Ok(BuiltIntent {
            intent: OrderIntent {
                quantity,
                price_per_unit: self.context.price_per_unit,
                total_price,
                delivery_address: address.to_string(),
                delivery_date,
                additional_dates: draft.additional_dates.clone(),
                instructions: draft.instructions.clone(),
            },
            balance,
            delta,
        })
    }
}
