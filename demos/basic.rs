use grok_search_http::{GrokClient, SearchOptions};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = GrokClient::from_env()?;

    let options = SearchOptions {
        platform: Some("GitHub".to_owned()),
        ..SearchOptions::default()
    };
    let answer = client.search("popular Rust HTTP clients", &options).await?;
    println!("{answer}");

    let page = client.fetch("https://www.rust-lang.org/").await?;
    println!("{page}");

    Ok(())
}
