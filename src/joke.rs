use serde::Deserialize;
use tracing::warn;

pub const JOKE_API_URL: &str = "https://api.chucknorris.io/jokes/random";
pub const JOKE_APOLOGY: &str = "Sorry, couldn't fetch a joke right now. Please try again later.";

#[derive(Deserialize)]
struct JokePayload {
    value: String,
}

/// Fetches random jokes from the Chuck Norris API. Every failure mode, from
/// transport errors to a garbled payload, degrades to the same fixed apology
/// so /chuck always has something to say.
pub struct JokeClient {
    url: String,
}

impl JokeClient {
    pub fn new() -> JokeClient {
        JokeClient {
            url: JOKE_API_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_url(url: &str) -> JokeClient {
        JokeClient {
            url: url.to_string(),
        }
    }

    pub async fn fetch_joke(&self) -> String {
        match reqwest::get(&self.url).await {
            Ok(resp) => {
                if !resp.status().is_success() {
                    warn!("Joke API answered with status {}", resp.status());
                    return JOKE_APOLOGY.to_string();
                }
                match resp.text().await {
                    Ok(text) => match serde_json::from_str::<JokePayload>(&text) {
                        Ok(payload) => payload.value,
                        Err(why) => {
                            warn!("Failed to parse joke payload: {}", why);
                            JOKE_APOLOGY.to_string()
                        }
                    },
                    Err(why) => {
                        warn!("Failed to read joke response: {}", why);
                        JOKE_APOLOGY.to_string()
                    }
                }
            }
            Err(why) => {
                warn!("Failed to reach the joke API: {}", why);
                JOKE_APOLOGY.to_string()
            }
        }
    }
}
