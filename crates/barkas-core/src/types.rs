//! # Domain Types
//!
//! Core domain types used throughout the storefront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │   OrderItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  order_id (FK)  │       │
//! │  │  name, category │   │  customer_*     │   │  product_name   │       │
//! │  │  price, stock   │   │  total          │   │  price (frozen) │       │
//! │  │  tags[]         │   │  statuses       │   │  quantity       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │      User       │   │  ActivityLog    │       │
//! │  │  name, phone    │   │  email, role    │   │  action         │       │
//! │  │  email, address │   │  name           │   │  details (JSON) │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Enums: PaymentMethod, PaymentStatus, OrderStatus, Role, ActivityAction │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Orders copy the product name and price into each `OrderItem`, so order
//! history stays correct after a product is edited or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{
    optional_text, validate_category, validate_email, validate_phone, validate_price,
    validate_product_name, validate_required, validate_stock, ValidationResult,
};

// =============================================================================
// Product
// =============================================================================

/// A product listed in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Long description shown on the detail page.
    pub description: String,

    /// Price in rupiah.
    pub price: i64,

    /// Optional product photo.
    pub image_url: Option<String>,

    /// Free-form category label ("Elektronik", "Fashion", ...).
    pub category: String,

    /// Units available.
    pub stock: i64,

    /// Search tags.
    pub tags: Vec<String>,

    /// Shown on the home page.
    pub is_featured: bool,

    /// Displays a "limited stock" badge.
    pub is_limited_stock: bool,

    /// Optional barcode (admin search).
    pub barcode: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_rupiah(self.price)
    }

    /// True while at least one unit is available.
    #[inline]
    pub fn is_in_stock(&self) -> bool {
        self.stock > 0
    }

    /// True when stock has dropped below `threshold` (dashboard warning).
    #[inline]
    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.stock < threshold
    }
}

/// Admin form for creating or editing a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub image_url: Option<String>,
    pub category: String,
    pub stock: i64,
    /// A JSON array, or one comma-separated string.
    #[serde(deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    pub is_featured: bool,
    pub is_limited_stock: bool,
    pub barcode: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagField {
    List(Vec<String>),
    Text(String),
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match TagField::deserialize(deserializer)? {
        TagField::List(tags) => tags,
        TagField::Text(raw) => ProductInput::parse_tags(&raw),
    })
}

impl ProductInput {
    /// Splits a comma-separated tag field ("vintage, kamera ,") into tags.
    pub fn parse_tags(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Validates the form and returns a normalised copy.
    ///
    /// ## Normalisation
    /// - name, description and category are trimmed
    /// - tags are trimmed and empty tags dropped
    /// - blank image URL / barcode become `None`
    pub fn validate(&self) -> ValidationResult<ProductInput> {
        validate_product_name(&self.name)?;
        validate_price(self.price)?;
        validate_stock(self.stock)?;
        validate_category(&self.category)?;

        Ok(ProductInput {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            price: self.price,
            image_url: optional_text(self.image_url.as_deref()),
            category: self.category.trim().to_string(),
            stock: self.stock,
            tags: self
                .tags
                .iter()
                .map(|t| t.trim())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect(),
            is_featured: self.is_featured,
            is_limited_stock: self.is_limited_stock,
            barcode: optional_text(self.barcode.as_deref()),
        })
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer record kept by the back office.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Admin form for creating or editing a customer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CustomerInput {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: String,
}

impl CustomerInput {
    /// Validates the form and returns a trimmed copy.
    pub fn validate(&self) -> ValidationResult<CustomerInput> {
        validate_required("name", &self.name)?;
        validate_phone(&self.phone)?;

        let email = optional_text(self.email.as_deref());
        if let Some(ref email) = email {
            validate_email(email)?;
        }

        Ok(CustomerInput {
            name: self.name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email,
            address: self.address.trim().to_string(),
        })
    }
}

// =============================================================================
// Order Enums
// =============================================================================

/// How the customer intends to pay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PaymentMethod {
    /// Down payment, balance on delivery.
    Dp,
    /// Cash on delivery.
    #[default]
    Cod,
    /// Cash at the shop.
    Cash,
    /// Bank transfer.
    Transfer,
}

/// Payment progress of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentStatus {
    #[default]
    Pending,
    /// Down payment received.
    DpPaid,
    Paid,
}

/// Fulfilment progress of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Dp => "dp",
            PaymentMethod::Cod => "cod",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Transfer => "transfer",
        }
    }
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::DpPaid => "dp_paid",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: ["pending", "processing", "shipped", "delivered", "cancelled"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(PaymentStatus::Pending),
            "dp_paid" => Ok(PaymentStatus::DpPaid),
            "paid" => Ok(PaymentStatus::Paid),
            _ => Err(ValidationError::NotAllowed {
                field: "paymentStatus".to_string(),
                allowed: vec![
                    "pending".to_string(),
                    "dp_paid".to_string(),
                    "paid".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order.
///
/// Customer details are copied from the checkout form, not linked to a
/// `Customer` row: guests can order without an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub subtotal: i64,
    pub discount: i64,
    pub shipping_cost: i64,
    pub total: i64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub notes: Option<String>,
    pub voucher_code: Option<String>,
    /// Staff member who placed the order, if signed in.
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_rupiah(self.total)
    }

    #[inline]
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }
}

/// A line of an order with frozen product name and price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    /// `None` once the product has been deleted from the catalog.
    pub product_id: Option<String>,
    pub product_name: String,
    pub quantity: i64,
    pub price: i64,
    pub total: i64,
}

/// An order together with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Checkout form submitted by the visitor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct CheckoutForm {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub voucher_code: Option<String>,
}

impl CheckoutForm {
    /// Validates required fields and returns a trimmed copy.
    ///
    /// Blank notes / voucher codes become `None`.
    pub fn validate(&self) -> ValidationResult<CheckoutForm> {
        validate_required("customerName", &self.customer_name)?;
        validate_phone(&self.customer_phone)?;
        validate_required("customerAddress", &self.customer_address)?;

        Ok(CheckoutForm {
            customer_name: self.customer_name.trim().to_string(),
            customer_phone: self.customer_phone.trim().to_string(),
            customer_address: self.customer_address.trim().to_string(),
            payment_method: self.payment_method,
            notes: optional_text(self.notes.as_deref()),
            voucher_code: optional_text(self.voucher_code.as_deref()),
        })
    }
}

// =============================================================================
// Users & Roles
// =============================================================================

/// Staff role controlling access to admin screens.
///
/// ## Permissions
/// ```text
/// ┌──────────┬──────────────┬────────────────────────┐
/// │ Role     │ Admin panel  │ Activity log           │
/// ├──────────┼──────────────┼────────────────────────┤
/// │ admin    │ ✅           │ everyone               │
/// │ manager  │ ✅           │ everyone               │
/// │ employee │ ✅           │ own entries only       │
/// └──────────┴──────────────┴────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Employee => "employee",
        }
    }

    /// Display label used in the back office.
    pub const fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Manager => "Manajer",
            Role::Employee => "Karyawan",
        }
    }

    /// Every staff role may open the admin panel.
    pub const fn can_access_admin(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager | Role::Employee)
    }

    /// Admins and managers see everyone's activity; employees only their own.
    pub const fn can_view_all_activity(&self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "employee" => Ok(Role::Employee),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec![
                    "admin".to_string(),
                    "manager".to_string(),
                    "employee".to_string(),
                ],
            }),
        }
    }
}

/// A staff account. The password hash never leaves `barkas-db`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Activity Log
// =============================================================================

/// Auditable staff actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ActivityAction {
    CreateProduct,
    UpdateProduct,
    DeleteProduct,
    CreateOrder,
    UpdateOrderStatus,
    UpdatePaymentStatus,
    CreateCustomer,
    UpdateCustomer,
    DeleteCustomer,
    UpdateProfile,
}

impl ActivityAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::CreateProduct => "create_product",
            ActivityAction::UpdateProduct => "update_product",
            ActivityAction::DeleteProduct => "delete_product",
            ActivityAction::CreateOrder => "create_order",
            ActivityAction::UpdateOrderStatus => "update_order_status",
            ActivityAction::UpdatePaymentStatus => "update_payment_status",
            ActivityAction::CreateCustomer => "create_customer",
            ActivityAction::UpdateCustomer => "update_customer",
            ActivityAction::DeleteCustomer => "delete_customer",
            ActivityAction::UpdateProfile => "update_profile",
        }
    }

    /// Human-readable description for the activity feed.
    pub const fn label(&self) -> &'static str {
        match self {
            ActivityAction::CreateProduct => "Menambah produk",
            ActivityAction::UpdateProduct => "Memperbarui produk",
            ActivityAction::DeleteProduct => "Menghapus produk",
            ActivityAction::CreateOrder => "Membuat pesanan",
            ActivityAction::UpdateOrderStatus => "Memperbarui status pesanan",
            ActivityAction::UpdatePaymentStatus => "Memperbarui status pembayaran",
            ActivityAction::CreateCustomer => "Menambah pelanggan",
            ActivityAction::UpdateCustomer => "Memperbarui pelanggan",
            ActivityAction::DeleteCustomer => "Menghapus pelanggan",
            ActivityAction::UpdateProfile => "Memperbarui profil",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the activity feed, joined with the acting user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ActivityLog {
    pub id: String,
    pub user_id: String,
    pub action: ActivityAction,
    #[ts(type = "Record<string, unknown>")]
    pub details: serde_json::Value,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
