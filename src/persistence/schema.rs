use sqlx::SqlitePool;

// ============================================================================
// Schema
// ============================================================================
//
// products, product_stock, carts, cart_items, wishlist and reviews belong to
// the storefront collaborators; this service reads them (and clears carts).
// orders, order_items, order_tracking, notifications and dead_letter_queue
// are written here.
//
// ============================================================================

const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS products (
        product_id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        price_cents INTEGER NOT NULL CHECK (price_cents > 0)
    )",
    "CREATE TABLE IF NOT EXISTS product_stock (
        product_id INTEGER NOT NULL REFERENCES products(product_id),
        color TEXT NOT NULL,
        size TEXT NOT NULL,
        quantity INTEGER NOT NULL CHECK (quantity >= 0),
        PRIMARY KEY (product_id, color, size)
    )",
    "CREATE TABLE IF NOT EXISTS carts (
        cart_id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_email TEXT NOT NULL UNIQUE,
        total_cents INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE TABLE IF NOT EXISTS cart_items (
        cart_id INTEGER NOT NULL REFERENCES carts(cart_id),
        product_id INTEGER NOT NULL REFERENCES products(product_id),
        color TEXT NOT NULL,
        size TEXT NOT NULL,
        quantity INTEGER NOT NULL CHECK (quantity > 0),
        PRIMARY KEY (cart_id, product_id, color, size)
    )",
    "CREATE TABLE IF NOT EXISTS wishlist (
        email TEXT NOT NULL,
        product_id INTEGER NOT NULL REFERENCES products(product_id),
        PRIMARY KEY (email, product_id)
    )",
    "CREATE TABLE IF NOT EXISTS reviews (
        review_id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT NOT NULL,
        product_id INTEGER NOT NULL REFERENCES products(product_id),
        rating INTEGER NOT NULL,
        comment TEXT
    )",
    "CREATE TABLE IF NOT EXISTS orders (
        order_id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_email TEXT NOT NULL,
        created_at TEXT NOT NULL,
        total_cents INTEGER NOT NULL,
        payment_method TEXT NOT NULL,
        shipping_speed TEXT NOT NULL,
        is_gift INTEGER NOT NULL,
        gift_first_name TEXT,
        gift_last_name TEXT,
        street TEXT NOT NULL,
        civic_number TEXT NOT NULL,
        postal_code TEXT NOT NULL,
        city TEXT NOT NULL,
        idempotency_key TEXT
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS orders_idempotency_key
        ON orders (owner_email, idempotency_key)
        WHERE idempotency_key IS NOT NULL",
    "CREATE TABLE IF NOT EXISTS order_items (
        order_id INTEGER NOT NULL REFERENCES orders(order_id),
        product_id INTEGER NOT NULL,
        color TEXT NOT NULL,
        size TEXT NOT NULL,
        quantity INTEGER NOT NULL,
        purchase_price_cents INTEGER NOT NULL,
        PRIMARY KEY (order_id, product_id, color, size)
    )",
    "CREATE TABLE IF NOT EXISTS order_tracking (
        order_id INTEGER NOT NULL REFERENCES orders(order_id),
        stage TEXT NOT NULL,
        latitude REAL,
        longitude REAL,
        actual_arrival TEXT,
        estimated_arrival TEXT NOT NULL,
        last_updated TEXT NOT NULL,
        PRIMARY KEY (order_id, stage)
    )",
    "CREATE TABLE IF NOT EXISTS notifications (
        notification_id INTEGER PRIMARY KEY AUTOINCREMENT,
        recipient_email TEXT NOT NULL,
        category TEXT NOT NULL,
        message TEXT NOT NULL,
        created_at TEXT NOT NULL,
        is_read INTEGER NOT NULL DEFAULT 0
    )",
    "CREATE INDEX IF NOT EXISTS notifications_recipient
        ON notifications (recipient_email)",
    "CREATE TABLE IF NOT EXISTS dead_letter_queue (
        id TEXT PRIMARY KEY,
        recipient_email TEXT NOT NULL,
        category TEXT NOT NULL,
        payload TEXT NOT NULL,
        error_message TEXT NOT NULL,
        failure_count INTEGER NOT NULL,
        first_failed_at TEXT NOT NULL,
        last_failed_at TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
];

/// Create all tables and indexes; safe to run on every start.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!(statements = STATEMENTS.len(), "Database schema ready");
    Ok(())
}
