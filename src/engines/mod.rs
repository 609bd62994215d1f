// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod chromium_driver;
pub mod http_driver;
pub mod session_pool;
pub mod traits;
