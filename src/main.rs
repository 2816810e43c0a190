#[tokio::main]
async fn main() {
    let code = match murmur::node::run_cli().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("murmur: {:#}", e);
            1
        }
    };
    // stdin reads park a blocking thread the runtime would otherwise wait on
    std::process::exit(code);
}
