// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Which caching strategy a request gets.

use sitekit_core::{Destination, FetchRequest};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ResourceClass {
    Document,
    Script,
    Style,
    Image,
    Font,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Always revalidate with the network; fall back to the cache offline.
    NetworkFirst,
    /// Serve a cached copy when present; populate on miss.
    CacheFirst,
}

impl ResourceClass {
    /// Classify by the request destination, then by path extension.
    pub fn of(request: &FetchRequest) -> Self {
        if request.is_navigation() {
            return ResourceClass::Document;
        }
        match request.destination {
            Destination::Document => ResourceClass::Document,
            Destination::Script => ResourceClass::Script,
            Destination::Style => ResourceClass::Style,
            Destination::Image => ResourceClass::Image,
            Destination::Font => ResourceClass::Font,
            Destination::Manifest | Destination::Other => Self::from_extension(&request.url),
        }
    }

    fn from_extension(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let file = path.rsplit('/').next().unwrap_or(path);
        let Some((_, ext)) = file.rsplit_once('.') else {
            return ResourceClass::Other;
        };
        match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" => ResourceClass::Document,
            "js" | "mjs" => ResourceClass::Script,
            "css" => ResourceClass::Style,
            "png" | "jpg" | "jpeg" | "gif" | "webp" | "avif" | "svg" | "ico" => {
                ResourceClass::Image
            }
            "woff" | "woff2" | "ttf" | "otf" | "eot" => ResourceClass::Font,
            _ => ResourceClass::Other,
        }
    }

    pub fn strategy(self) -> Strategy {
        match self {
            ResourceClass::Image | ResourceClass::Font => Strategy::CacheFirst,
            _ => Strategy::NetworkFirst,
        }
    }
}
