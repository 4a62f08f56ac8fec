//! Outbound adapters implementing the domain ports.

pub mod supabase;
