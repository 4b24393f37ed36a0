// Snowcap: Synthesizing Network-Wide Configuration Updates
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

#![cfg(test)]

use std::time::Duration;

use crate::dedup::DuplicateFilter;

#[test]
fn add_if_new_is_true_exactly_once_per_id() {
    let filter = DuplicateFilter::default();
    assert!(filter.add_if_new("m1"));
    assert!(!filter.add_if_new("m1"));
    assert!(!filter.add_if_new("m1"));
}

#[test]
fn distinct_ids_are_each_accepted_once() {
    let filter = DuplicateFilter::default();
    assert!(filter.add_if_new("a"));
    assert!(filter.add_if_new("b"));
    assert_eq!(filter.len(), 2);
}

#[test]
fn entries_are_purged_after_the_ttl_window() {
    let filter = DuplicateFilter::new(Duration::from_millis(5));
    assert!(filter.add_if_new("m1"));
    std::thread::sleep(Duration::from_millis(30));
    assert!(filter.add_if_new("m1"));
}

#[test]
fn is_empty_reflects_purge() {
    let filter = DuplicateFilter::new(Duration::from_millis(5));
    filter.add_if_new("m1");
    std::thread::sleep(Duration::from_millis(30));
    filter.add_if_new("m2");
    assert_eq!(filter.len(), 1);
    assert!(!filter.is_empty());
}
