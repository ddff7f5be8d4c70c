// SPDX-FileCopyrightText: 2026 Pitcrew Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per table.

pub mod audit;
pub mod guild_configs;
pub mod subsystems;
pub mod users;
pub mod work_orders;
