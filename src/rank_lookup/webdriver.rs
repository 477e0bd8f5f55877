use async_trait::async_trait;
use std::time::Duration;
use thirtyfour::prelude::*;
use thirtyfour::ChromiumLikeCapabilities;
use thirtyfour::error::WebDriverError;
use tracing::debug;

use crate::config::BrowserConfig;
use crate::error::{ExtractError, ExtractResult};
use crate::rank_lookup::{BrowserSession, Locator, SessionFactory};

const CHROME_ARGS: &[&str] = &["--disable-gpu", "--no-sandbox", "--disable-dev-shm-usage"];

/// Opens Chrome sessions through a running chromedriver.
pub struct WebDriverFactory {
    server_url: String,
    headless: bool,
    poll_interval: Duration,
}

impl WebDriverFactory {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            server_url: config.webdriver_url.clone(),
            headless: config.headless,
            poll_interval: config.poll_interval(),
        }
    }
}

fn browser_err(e: WebDriverError) -> ExtractError {
    ExtractError::Browser(e.to_string())
}

#[async_trait]
impl SessionFactory for WebDriverFactory {
    async fn open(&self) -> ExtractResult<Box<dyn BrowserSession>> {
        let mut caps = DesiredCapabilities::chrome();
        if self.headless {
            caps.add_arg("--headless").map_err(browser_err)?;
        }
        for arg in CHROME_ARGS {
            caps.add_arg(arg).map_err(browser_err)?;
        }

        debug!("Opening WebDriver session at {}", self.server_url);
        let driver = WebDriver::new(self.server_url.as_str(), caps)
            .await
            .map_err(browser_err)?;

        Ok(Box::new(WebDriverSession {
            driver: Some(driver),
            poll_interval: self.poll_interval,
        }))
    }
}

/// One live browser. `close` quits it; later calls fail instead of reusing it.
pub struct WebDriverSession {
    driver: Option<WebDriver>,
    poll_interval: Duration,
}

impl WebDriverSession {
    fn driver(&self) -> ExtractResult<&WebDriver> {
        self.driver
            .as_ref()
            .ok_or_else(|| ExtractError::Browser("session already closed".to_string()))
    }
}

fn by(target: &Locator) -> By {
    match target {
        Locator::Id(id) => By::Id(id.as_str()),
        Locator::XPath(path) => By::XPath(path.as_str()),
    }
}

#[async_trait]
impl BrowserSession for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> ExtractResult<()> {
        self.driver()?.goto(url).await.map_err(browser_err)
    }

    async fn fill(&mut self, target: &Locator, text: &str) -> ExtractResult<()> {
        let elem = self.driver()?.find(by(target)).await.map_err(browser_err)?;
        elem.send_keys(text).await.map_err(browser_err)
    }

    async fn wait_clickable(&mut self, target: &Locator, timeout: Duration) -> ExtractResult<bool> {
        let found = self
            .driver()?
            .query(by(target))
            .wait(timeout, self.poll_interval)
            .and_clickable()
            .first()
            .await;
        Ok(match found {
            Ok(_) => true,
            Err(e) => {
                debug!("{:?} not clickable within {:?}: {}", target, timeout, e);
                false
            }
        })
    }

    async fn wait_present(&mut self, target: &Locator, timeout: Duration) -> ExtractResult<bool> {
        let found = self
            .driver()?
            .query(by(target))
            .wait(timeout, self.poll_interval)
            .first()
            .await;
        Ok(match found {
            Ok(_) => true,
            Err(e) => {
                debug!("{:?} not present within {:?}: {}", target, timeout, e);
                false
            }
        })
    }

    async fn move_and_click(&mut self, target: &Locator) -> ExtractResult<()> {
        let driver = self.driver()?;
        let elem = driver.find(by(target)).await.map_err(browser_err)?;
        driver
            .action_chain()
            .move_to_element_center(&elem)
            .click()
            .perform()
            .await
            .map_err(browser_err)
    }

    async fn count(&mut self, target: &Locator) -> ExtractResult<usize> {
        let elems = self.driver()?.find_all(by(target)).await.map_err(browser_err)?;
        Ok(elems.len())
    }

    async fn text(&mut self, target: &Locator) -> ExtractResult<String> {
        let elem = self
            .driver()?
            .find(by(target))
            .await
            .map_err(|_| ExtractError::StructureMismatch("rank table cell"))?;
        elem.text().await.map_err(browser_err)
    }

    async fn close(&mut self) -> ExtractResult<()> {
        match self.driver.take() {
            Some(driver) => driver.quit().await.map_err(browser_err),
            None => Ok(()),
        }
    }
}
