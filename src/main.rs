#[actix_web::main]
async fn main() {
    if let Err(e) = sales_dashboard_lib::run().await {
        eprintln!("sales-dashboard: {}", e);
        std::process::exit(1);
    }
}
