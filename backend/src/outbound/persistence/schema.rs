//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly.

diesel::table! {
    /// Roster accounts.
    users (id) {
        id -> Int8,
        /// Unique, lower-cased login email.
        email -> Varchar,
        name -> Varchar,
        /// Argon2 PHC string.
        password_hash -> Varchar,
        /// One of `user`, `admin`, `super_admin`.
        role -> Varchar,
        is_active -> Bool,
        /// Weak back-reference to the creating account (`ON DELETE SET NULL`).
        created_by_id -> Nullable<Int8>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Immutable location samples (`ON DELETE CASCADE` from users).
    locations (id) {
        id -> Int8,
        user_id -> Int8,
        latitude -> Float8,
        longitude -> Float8,
        speed -> Nullable<Float8>,
        heading -> Nullable<Float8>,
        address -> Nullable<Varchar>,
        timestamp -> Timestamptz,
    }
}

diesel::joinable!(locations -> users (user_id));
diesel::allow_tables_to_appear_in_same_query!(users, locations);
