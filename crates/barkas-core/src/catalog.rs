//! # Catalog & List Filters
//!
//! Search and filter helpers behind the catalog page and the admin lists.
//!
//! Every filter is a case-insensitive substring match. A blank query
//! matches everything, so the unfiltered list is the default view.

use std::collections::BTreeSet;

use crate::types::{Customer, Order, OrderStatus, OrderWithItems, PaymentStatus, Product};

/// Lower-cased, trimmed query; `None` when blank.
fn needle(query: &str) -> Option<String> {
    let q = query.trim();
    (!q.is_empty()).then(|| q.to_lowercase())
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

// =============================================================================
// Products
// =============================================================================

/// Storefront catalog search.
///
/// ## Matching
/// - `query` against name, description or any tag
/// - `category` (when given and non-blank) must match exactly
///
/// ## Example
/// ```rust
/// use barkas_core::catalog::filter_catalog;
/// # use barkas_core::types::Product;
/// # use chrono::Utc;
/// # let p = |id: &str, name: &str, cat: &str| Product {
/// #     id: id.into(), name: name.into(), description: String::new(), price: 1,
/// #     image_url: None, category: cat.into(), stock: 1, tags: vec![],
/// #     is_featured: false, is_limited_stock: false, barcode: None,
/// #     created_at: Utc::now(), updated_at: Utc::now(),
/// # };
/// let products = vec![p("1", "Kamera Analog", "Elektronik"), p("2", "Jaket Denim", "Fashion")];
///
/// assert_eq!(filter_catalog(&products, "kamera", None).len(), 1);
/// assert_eq!(filter_catalog(&products, "", Some("Fashion"))[0].id, "2");
/// ```
pub fn filter_catalog<'a>(
    products: &'a [Product],
    query: &str,
    category: Option<&str>,
) -> Vec<&'a Product> {
    let q = needle(query);
    let category = category.map(str::trim).filter(|c| !c.is_empty());

    products
        .iter()
        .filter(|p| category.map_or(true, |c| p.category == c))
        .filter(|p| match &q {
            None => true,
            Some(q) => {
                contains(&p.name, q)
                    || contains(&p.description, q)
                    || p.tags.iter().any(|t| contains(t, q))
            }
        })
        .collect()
}

/// Admin product list search: name, category or barcode.
pub fn filter_admin_products<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let Some(q) = needle(query) else {
        return products.iter().collect();
    };

    products
        .iter()
        .filter(|p| {
            contains(&p.name, &q)
                || contains(&p.category, &q)
                || p.barcode.as_deref().is_some_and(|b| contains(b, &q))
        })
        .collect()
}

/// Distinct non-empty categories, sorted.
pub fn categories(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .map(|p| p.category.trim())
        .filter(|c| !c.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

// =============================================================================
// Customers
// =============================================================================

/// Admin customer search: name, phone or email.
pub fn filter_customers<'a>(customers: &'a [Customer], query: &str) -> Vec<&'a Customer> {
    let Some(q) = needle(query) else {
        return customers.iter().collect();
    };

    customers
        .iter()
        .filter(|c| {
            contains(&c.name, &q)
                || c.phone.contains(q.as_str())
                || c.email.as_deref().is_some_and(|e| contains(e, &q))
        })
        .collect()
}

// =============================================================================
// Orders
// =============================================================================

/// True when `order` matches the admin order filters.
///
/// `query` matches customer name, phone or order id.
pub fn order_matches(
    order: &Order,
    query: &str,
    order_status: Option<OrderStatus>,
    payment_status: Option<PaymentStatus>,
) -> bool {
    if order_status.is_some_and(|s| order.order_status != s) {
        return false;
    }
    if payment_status.is_some_and(|s| order.payment_status != s) {
        return false;
    }

    match needle(query) {
        None => true,
        Some(q) => {
            contains(&order.customer_name, &q)
                || order.customer_phone.contains(q.as_str())
                || contains(&order.id, &q)
        }
    }
}

/// Admin order list filter.
pub fn filter_orders<'a>(
    orders: &'a [OrderWithItems],
    query: &str,
    order_status: Option<OrderStatus>,
    payment_status: Option<PaymentStatus>,
) -> Vec<&'a OrderWithItems> {
    orders
        .iter()
        .filter(|o| order_matches(&o.order, query, order_status, payment_status))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PaymentMethod;
    use chrono::Utc;

    fn product(id: &str, name: &str, category: &str, tags: &[&str]) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            description: format!("Deskripsi {}", name),
            price: 10_000,
            image_url: None,
            category: category.to_string(),
            stock: 3,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            is_featured: false,
            is_limited_stock: false,
            barcode: Some(format!("899{}", id)),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn order(id: &str, name: &str, phone: &str, status: OrderStatus, paid: PaymentStatus) -> OrderWithItems {
        OrderWithItems {
            order: Order {
                id: id.to_string(),
                customer_name: name.to_string(),
                customer_phone: phone.to_string(),
                customer_address: "Denpasar".to_string(),
                subtotal: 1,
                discount: 0,
                shipping_cost: 0,
                total: 1,
                payment_method: PaymentMethod::Cod,
                payment_status: paid,
                order_status: status,
                notes: None,
                voucher_code: None,
                created_by: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            items: vec![],
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("1", "Kamera Analog", "Elektronik", &["retro", "foto"]),
            product("2", "Jaket Denim", "Fashion", &["vintage"]),
            product("3", "Radio Transistor", "Elektronik", &["Vintage"]),
            product("4", "Tanpa Kategori", "", &[]),
        ]
    }

    #[test]
    fn test_catalog_blank_query_matches_all() {
        let products = catalog();
        assert_eq!(filter_catalog(&products, "   ", None).len(), 4);
    }

    #[test]
    fn test_catalog_matches_tags_case_insensitively() {
        let products = catalog();
        let ids: Vec<_> = filter_catalog(&products, "VINTAGE", None)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn test_catalog_category_is_exact() {
        let products = catalog();
        assert_eq!(filter_catalog(&products, "", Some("Elektronik")).len(), 2);
        assert!(filter_catalog(&products, "", Some("elektronik")).is_empty());
        assert_eq!(filter_catalog(&products, "vintage", Some("Fashion")).len(), 1);
        assert_eq!(filter_catalog(&products, "", Some(" ")).len(), 4);
    }

    #[test]
    fn test_admin_products_search_barcode() {
        let products = catalog();
        let found = filter_admin_products(&products, "8993");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "3");
        assert_eq!(filter_admin_products(&products, "fashion").len(), 1);
    }

    #[test]
    fn test_categories_sorted_distinct() {
        assert_eq!(categories(&catalog()), vec!["Elektronik", "Fashion"]);
    }

    #[test]
    fn test_filter_customers() {
        let now = Utc::now();
        let customers = vec![Customer {
            id: "c1".to_string(),
            name: "Ketut Sari".to_string(),
            phone: "081999000111".to_string(),
            email: Some("ketut@example.com".to_string()),
            address: String::new(),
            created_at: now,
            updated_at: now,
        }];

        assert_eq!(filter_customers(&customers, "sari").len(), 1);
        assert_eq!(filter_customers(&customers, "000111").len(), 1);
        assert_eq!(filter_customers(&customers, "EXAMPLE").len(), 1);
        assert!(filter_customers(&customers, "budi").is_empty());
    }

    #[test]
    fn test_filter_orders() {
        let orders = vec![
            order("ord-aaa", "Made", "0811", OrderStatus::Pending, PaymentStatus::Pending),
            order("ord-bbb", "Nyoman", "0822", OrderStatus::Shipped, PaymentStatus::Paid),
            order("ord-ccc", "Komang", "0833", OrderStatus::Shipped, PaymentStatus::DpPaid),
        ];

        assert_eq!(filter_orders(&orders, "", None, None).len(), 3);
        assert_eq!(filter_orders(&orders, "", Some(OrderStatus::Shipped), None).len(), 2);
        assert_eq!(
            filter_orders(&orders, "", Some(OrderStatus::Shipped), Some(PaymentStatus::Paid)).len(),
            1
        );
        assert_eq!(filter_orders(&orders, "BBB", None, None)[0].order.customer_name, "Nyoman");
        assert_eq!(filter_orders(&orders, "0833", None, None).len(), 1);
    }
}
