//! Concrete pages built on [`Page`](crate::page::Page).

pub mod admin_dashboard;
pub mod my_orders;
pub mod shipment_history;
pub mod track_order;

pub use admin_dashboard::AdminDashboard;
pub use my_orders::MyOrdersPage;
pub use shipment_history::ShipmentHistoryPage;
pub use track_order::TrackOrderPage;
