//! Diesel table definitions for the airport schema.
//!
//! The schema is provisioned externally; this service runs no migrations.

diesel::table! {
    flights (id) {
        id -> Uuid,
        flight_number -> Text,
        origin -> Text,
        destination -> Text,
        scheduled_at -> Timestamptz,
        status -> Text,
    }
}

diesel::table! {
    flight_delay_samples (id) {
        id -> Uuid,
        flight_id -> Uuid,
        weather -> Text,
        delay_probability -> Float8,
    }
}

diesel::table! {
    bookings (id) {
        id -> Uuid,
        flight_id -> Uuid,
        user_id -> Uuid,
        user_name -> Text,
        email -> Text,
        booked_at -> Timestamptz,
    }
}

diesel::table! {
    payments (id) {
        id -> Uuid,
        booking_id -> Uuid,
        amount_cents -> Int8,
        status -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    users (id) {
        id -> Uuid,
        username -> Text,
        email -> Text,
        password_hash -> Text,
        role -> Text,
    }
}

diesel::table! {
    webhook_events (event_id) {
        event_id -> Text,
        processed_at -> Timestamptz,
    }
}

diesel::joinable!(flight_delay_samples -> flights (flight_id));
diesel::joinable!(bookings -> flights (flight_id));
diesel::joinable!(bookings -> users (user_id));
diesel::joinable!(payments -> bookings (booking_id));

diesel::allow_tables_to_appear_in_same_query!(
    flights,
    flight_delay_samples,
    bookings,
    payments,
    users,
    webhook_events,
);
