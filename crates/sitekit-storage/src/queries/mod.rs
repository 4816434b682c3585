// SPDX-FileCopyrightText: 2026 Sitekit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules over [`Database`](crate::Database).

pub mod cache;
pub mod kv;
