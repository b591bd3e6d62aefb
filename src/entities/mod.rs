pub mod alert;
pub mod forecast;
pub mod inventory_item;
pub mod sales_record;
pub mod supplier;
