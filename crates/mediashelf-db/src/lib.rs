//! Mediashelf-DB: Database schema, migrations, and query operations
//!
//! SQLite storage for the mediashelf catalog using rusqlite and r2d2
//! connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use mediashelf_db::pool::{init_pool, get_conn};
//! use mediashelf_db::queries::media;
//!
//! let pool = init_pool("/var/lib/mediashelf/catalog.db").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let count = media::count_media(&conn, &Default::default()).unwrap();
//! println!("{} files catalogued", count);
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
