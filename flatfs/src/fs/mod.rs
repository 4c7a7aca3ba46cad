// SPDX-License-Identifier: MIT

pub mod flat;
