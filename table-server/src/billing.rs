//! Bill split calculator
//!
//! Pure read over an aggregate snapshot: items grouped by attributing
//! guest, each guest charged tax and service on their own subtotal at the
//! order's rates. Independent rounding means the per-guest totals may sum
//! to a few minor units off the order total; the order total is returned
//! for cross-check and the drift is bounded by guest_count × 0.01.

use rust_decimal::Decimal;
use shared::models::{Order, OrderGuest, OrderItem, Restaurant};
use shared::response::{BillSplit, GuestBill};

use crate::orders::money::{to_decimal, to_f64};

/// Compute the per-guest bill split for the current aggregate snapshot
///
/// Every joined guest appears, including those with no items (zero bill).
pub fn split_bill(
    order: &Order,
    items: &[OrderItem],
    guests: &[OrderGuest],
    restaurant: &Restaurant,
) -> BillSplit {
    let tax_rate = to_decimal(restaurant.tax_rate) / Decimal::ONE_HUNDRED;
    let service_rate = to_decimal(restaurant.service_charge_rate) / Decimal::ONE_HUNDRED;

    let guest_bills = guests
        .iter()
        .map(|guest| {
            let guest_items: Vec<OrderItem> = items
                .iter()
                .filter(|i| i.guest_id == guest.id)
                .cloned()
                .collect();

            // Same policy as the order totals: accumulate unrounded,
            // round each stored field once
            let subtotal: Decimal = guest_items
                .iter()
                .map(|i| to_decimal(i.unit_price) * Decimal::from(i.quantity))
                .sum();
            let tax = subtotal * tax_rate;
            let service = subtotal * service_rate;

            let subtotal_f = to_f64(subtotal);
            let tax_f = to_f64(tax);
            let service_f = to_f64(service);
            let total =
                to_f64(to_decimal(subtotal_f) + to_decimal(tax_f) + to_decimal(service_f));

            GuestBill {
                guest_id: guest.id.clone(),
                guest_name: guest.name.clone(),
                items: guest_items,
                subtotal: subtotal_f,
                tax_amount: tax_f,
                service_charge: service_f,
                total,
            }
        })
        .collect();

    BillSplit {
        order_id: order.id.clone(),
        order_number: order.order_number.clone(),
        guests: guest_bills,
        order_total: order.total_amount,
    }
}
