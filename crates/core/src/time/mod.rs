pub mod cache_date;
