//! OPERA Cloud endpoint catalogue.
//!
//! One `ToolSpec` per exposed operation, grouped by OHIP module:
//! reservations (`rsv`, `par`), guest profiles (`crm`), front office (`fof`),
//! housekeeping and inventory (`hsk`, `inv`), cashiering (`csh`) and guest
//! activities (`act`). Argument names are what the MCP client sends; wire
//! names are the OHIP field names.

use serde_json::json;

use super::catalog::{
    any_object, object_with_arrays, HttpMethod, ParamDef, ParamType, ToolSpec, HOTEL_ID_PARAM,
};

const ROOM_STATUSES: &[&str] = &["Clean", "Dirty", "Inspected", "Pickup", "OutOfOrder", "OutOfService"];
const PRIORITIES: &[&str] = &["low", "normal", "high", "urgent"];
const REFUND_METHODS: &[&str] = &["original_payment", "cash", "check", "credit", "transfer"];
const STOCK_REASONS: &[&str] = &["received", "used", "damaged", "lost", "count_correction"];

fn variants(values: &[&str]) -> ParamType {
    ParamType::Enum(values.iter().map(|v| v.to_string()).collect())
}

fn opt(inner: ParamType) -> ParamType {
    ParamType::optional(inner)
}

fn hotel_path() -> ParamDef {
    ParamDef::path(
        HOTEL_ID_PARAM,
        ParamType::Identifier,
        "Hotel code (defaults to the configured hotel)",
    )
}

/// Chain-level endpoints still scope by hotel through the `hotelId` query.
fn hotel_query() -> ParamDef {
    ParamDef::query(
        HOTEL_ID_PARAM,
        opt(ParamType::Identifier),
        "Hotel code (defaults to the configured hotel)",
    )
}

fn reservation_path() -> ParamDef {
    ParamDef::path(
        "reservationId",
        ParamType::Identifier,
        "Reservation id or confirmation number",
    )
}

fn profile_path() -> ParamDef {
    ParamDef::path("profileId", ParamType::Identifier, "Guest profile id")
}

fn limit(default: i64) -> ParamDef {
    ParamDef::query(
        "limit",
        ParamType::IntRange { min: 1, max: 100 },
        "Maximum results to return (1-100)",
    )
    .with_default(json!(default))
}

/// Every tool, in advertisement order.
pub fn catalogue() -> Vec<ToolSpec> {
    let mut tools = Vec::new();
    tools.extend(reservation_tools());
    tools.extend(guest_tools());
    tools.extend(front_office_tools());
    tools.extend(housekeeping_tools());
    tools.extend(cashiering_tools());
    tools.extend(activity_tools());
    tools
}

// =============================================================================
// Reservations
// =============================================================================

fn reservation_tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            "search_reservations",
            HttpMethod::Get,
            "/rsv/v1/hotels/{hotelId}/reservations",
            "Search reservations by arrival/departure window, guest name, confirmation number or status",
        )
        .param(hotel_path())
        .param(ParamDef::query("arrivalDate", opt(ParamType::Date), "Earliest arrival (YYYY-MM-DD)").wire("arrivalStartDate"))
        .param(ParamDef::query("departureDate", opt(ParamType::Date), "Latest departure (YYYY-MM-DD)").wire("departureEndDate"))
        .param(ParamDef::query("guestName", opt(ParamType::String), "Guest surname, partial match").wire("surname"))
        .param(ParamDef::query("confirmationNumber", opt(ParamType::Identifier), "Exact confirmation number").wire("confirmationNumberList"))
        .param(ParamDef::query("status", opt(ParamType::StringList), "Reservation statuses (Reserved, InHouse, CheckedOut, Cancelled, NoShow)").wire("reservationStatus"))
        .param(ParamDef::query("roomType", opt(ParamType::String), "Room type code"))
        .param(limit(10))
        .date_order("arrivalDate", "departureDate")
        .response(object_with_arrays(&["reservations"])),
        ToolSpec::new(
            "get_reservation",
            HttpMethod::Get,
            "/rsv/v1/hotels/{hotelId}/reservations/{reservationId}",
            "Get full details of one reservation",
        )
        .param(hotel_path())
        .param(reservation_path())
        .param(ParamDef::query("fetchInstructions", opt(ParamType::StringList), "Extra sections to include (Folios, History, Comments)"))
        .response(any_object()),
        ToolSpec::new(
            "create_reservation",
            HttpMethod::Post,
            "/rsv/v1/hotels/{hotelId}/reservations",
            "Create a reservation for a guest",
        )
        .param(hotel_path())
        .param(ParamDef::body("guestFirstName", ParamType::String, "Guest first name").wire("reservation.guest.givenName"))
        .param(ParamDef::body("guestLastName", ParamType::String, "Guest last name").wire("reservation.guest.surname"))
        .param(ParamDef::body("guestEmail", opt(ParamType::String), "Guest email").wire("reservation.guest.email"))
        .param(ParamDef::body("guestPhone", opt(ParamType::String), "Guest phone").wire("reservation.guest.phone"))
        .param(ParamDef::body("arrivalDate", ParamType::Date, "Arrival date (YYYY-MM-DD)").wire("reservation.stay.arrivalDate"))
        .param(ParamDef::body("departureDate", ParamType::Date, "Departure date (YYYY-MM-DD)").wire("reservation.stay.departureDate"))
        .param(ParamDef::body("roomType", ParamType::String, "Room type code").wire("reservation.stay.roomType"))
        .param(ParamDef::body("rateCode", ParamType::String, "Rate plan code").wire("reservation.stay.ratePlanCode"))
        .param(ParamDef::body("adults", ParamType::IntRange { min: 1, max: 10 }, "Number of adults").wire("reservation.stay.adults").with_default(json!(1)))
        .param(ParamDef::body("children", ParamType::IntRange { min: 0, max: 10 }, "Number of children").wire("reservation.stay.children").with_default(json!(0)))
        .param(ParamDef::body("specialRequests", opt(ParamType::String), "Free-text requests").wire("reservation.comments"))
        .date_order("arrivalDate", "departureDate")
        .passthrough()
        .response(any_object()),
        ToolSpec::new(
            "modify_reservation",
            HttpMethod::Put,
            "/rsv/v1/hotels/{hotelId}/reservations/{reservationId}",
            "Change dates, room type, rate or guest count of a reservation",
        )
        .param(hotel_path())
        .param(reservation_path())
        .param(ParamDef::body("arrivalDate", opt(ParamType::Date), "New arrival date").wire("reservation.stay.arrivalDate"))
        .param(ParamDef::body("departureDate", opt(ParamType::Date), "New departure date").wire("reservation.stay.departureDate"))
        .param(ParamDef::body("roomType", opt(ParamType::String), "New room type").wire("reservation.stay.roomType"))
        .param(ParamDef::body("rateCode", opt(ParamType::String), "New rate plan").wire("reservation.stay.ratePlanCode"))
        .param(ParamDef::body("adults", opt(ParamType::IntRange { min: 1, max: 10 }), "Number of adults").wire("reservation.stay.adults"))
        .param(ParamDef::body("children", opt(ParamType::IntRange { min: 0, max: 10 }), "Number of children").wire("reservation.stay.children"))
        .param(ParamDef::body("specialRequests", opt(ParamType::String), "Free-text requests").wire("reservation.comments"))
        .date_order("arrivalDate", "departureDate")
        .passthrough()
        .response(any_object()),
        ToolSpec::new(
            "cancel_reservation",
            HttpMethod::Post,
            "/rsv/v1/hotels/{hotelId}/reservations/{reservationId}/cancellations",
            "Cancel a reservation",
        )
        .param(hotel_path())
        .param(reservation_path())
        .param(ParamDef::body("reason", ParamType::String, "Cancellation reason").wire("reason.description"))
        .param(ParamDef::body("chargeCancellationFee", ParamType::Bool, "Charge the cancellation fee").with_default(json!(false)))
        .param(ParamDef::body("cancellationFeeAmount", opt(ParamType::Number), "Fee amount when charged"))
        .response(any_object()),
        ToolSpec::new(
            "check_room_availability",
            HttpMethod::Get,
            "/par/v1/hotels/{hotelId}/availability",
            "Check room availability and rates for a stay",
        )
        .param(hotel_path())
        .param(ParamDef::query("arrivalDate", ParamType::Date, "Arrival date (YYYY-MM-DD)").wire("startDate"))
        .param(ParamDef::query("departureDate", ParamType::Date, "Departure date (YYYY-MM-DD)").wire("endDate"))
        .param(ParamDef::query("roomType", opt(ParamType::String), "Room type code"))
        .param(ParamDef::query("rateCode", opt(ParamType::String), "Rate plan code").wire("ratePlanCode"))
        .param(ParamDef::query("numberOfRooms", ParamType::IntRange { min: 1, max: 99 }, "Rooms needed").wire("roomCount").with_default(json!(1)))
        .param(ParamDef::query("adults", ParamType::IntRange { min: 1, max: 10 }, "Adults").with_default(json!(1)))
        .param(ParamDef::query("children", ParamType::IntRange { min: 0, max: 10 }, "Children").with_default(json!(0)))
        .date_order("arrivalDate", "departureDate")
        .response(any_object()),
        ToolSpec::new(
            "get_reservation_history",
            HttpMethod::Get,
            "/rsv/v1/hotels/{hotelId}/reservationHistory",
            "Past and upcoming reservations of a guest, matched by email, phone or name",
        )
        .param(hotel_path())
        .param(ParamDef::query("guestEmail", opt(ParamType::String), "Guest email").wire("email"))
        .param(ParamDef::query("guestPhone", opt(ParamType::String), "Guest phone").wire("phoneNumber"))
        .param(ParamDef::query("guestName", opt(ParamType::String), "Guest surname").wire("surname"))
        .param(ParamDef::query("dateFrom", opt(ParamType::Date), "Earliest stay date").wire("startDate"))
        .param(ParamDef::query("dateTo", opt(ParamType::Date), "Latest stay date").wire("endDate"))
        .param(limit(20))
        .date_order("dateFrom", "dateTo")
        .response(object_with_arrays(&["reservations"])),
    ]
}

// =============================================================================
// Guest profiles
// =============================================================================

fn guest_tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            "search_guests",
            HttpMethod::Get,
            "/crm/v1/profiles",
            "Search guest profiles by name, email, phone, loyalty number or company",
        )
        .param(hotel_query())
        .param(ParamDef::query("firstName", opt(ParamType::String), "Given name").wire("givenName"))
        .param(ParamDef::query("lastName", opt(ParamType::String), "Surname").wire("surname"))
        .param(ParamDef::query("email", opt(ParamType::String), "Email address"))
        .param(ParamDef::query("phone", opt(ParamType::String), "Phone number").wire("phoneNumber"))
        .param(ParamDef::query("loyaltyNumber", opt(ParamType::String), "Membership number").wire("membershipNumber"))
        .param(ParamDef::query("companyName", opt(ParamType::String), "Company name"))
        .param(limit(20))
        .response(object_with_arrays(&["profiles"])),
        ToolSpec::new(
            "get_guest_profile",
            HttpMethod::Get,
            "/crm/v1/profiles/{profileId}",
            "Get a guest profile",
        )
        .param(hotel_query())
        .param(profile_path())
        .param(ParamDef::query("fetchInstructions", opt(ParamType::StringList), "Extra sections (Preferences, Stays, Memberships)"))
        .response(any_object()),
        ToolSpec::new(
            "create_guest_profile",
            HttpMethod::Post,
            "/crm/v1/profiles",
            "Create a guest profile",
        )
        .param(hotel_query())
        .param(ParamDef::body("firstName", ParamType::String, "Given name").wire("profile.customer.personName.givenName"))
        .param(ParamDef::body("lastName", ParamType::String, "Surname").wire("profile.customer.personName.surname"))
        .param(ParamDef::body("email", opt(ParamType::String), "Email address").wire("profile.emails.email"))
        .param(ParamDef::body("phone", opt(ParamType::String), "Phone number").wire("profile.telephones.phoneNumber"))
        .param(ParamDef::body("addressLine1", opt(ParamType::String), "Street address").wire("profile.addresses.addressLine"))
        .param(ParamDef::body("city", opt(ParamType::String), "City").wire("profile.addresses.cityName"))
        .param(ParamDef::body("postalCode", opt(ParamType::String), "Postal code").wire("profile.addresses.postalCode"))
        .param(ParamDef::body("country", opt(ParamType::String), "ISO country code").wire("profile.addresses.country"))
        .param(ParamDef::body("dateOfBirth", opt(ParamType::Date), "Date of birth (YYYY-MM-DD)").wire("profile.customer.birthDate"))
        .passthrough()
        .response(any_object()),
        ToolSpec::new(
            "update_guest_profile",
            HttpMethod::Put,
            "/crm/v1/profiles/{profileId}",
            "Update fields of a guest profile",
        )
        .param(hotel_query())
        .param(profile_path())
        .param(ParamDef::body("firstName", opt(ParamType::String), "Given name").wire("profile.customer.personName.givenName"))
        .param(ParamDef::body("lastName", opt(ParamType::String), "Surname").wire("profile.customer.personName.surname"))
        .param(ParamDef::body("email", opt(ParamType::String), "Email address").wire("profile.emails.email"))
        .param(ParamDef::body("phone", opt(ParamType::String), "Phone number").wire("profile.telephones.phoneNumber"))
        .passthrough()
        .response(any_object()),
        ToolSpec::new(
            "get_guest_preferences",
            HttpMethod::Get,
            "/crm/v1/profiles/{profileId}/preferences",
            "List a guest's stored preferences",
        )
        .param(hotel_query())
        .param(profile_path())
        .param(ParamDef::query("category", opt(ParamType::String), "Preference category").wire("preferenceType"))
        .response(object_with_arrays(&["preferences"])),
        ToolSpec::new(
            "update_guest_preferences",
            HttpMethod::Put,
            "/crm/v1/profiles/{profileId}/preferences",
            "Replace a guest's preferences",
        )
        .param(hotel_query())
        .param(profile_path())
        .param(ParamDef::body("preferences", ParamType::Object, "Preference payload keyed by category").wire("profilePreferences"))
        .response(any_object()),
        ToolSpec::new(
            "get_guest_stay_history",
            HttpMethod::Get,
            "/crm/v1/profiles/{profileId}/stays",
            "List past stays of a guest",
        )
        .param(hotel_query())
        .param(profile_path())
        .param(ParamDef::query("dateFrom", opt(ParamType::Date), "Earliest stay date").wire("startDate"))
        .param(ParamDef::query("dateTo", opt(ParamType::Date), "Latest stay date").wire("endDate"))
        .param(limit(20))
        .date_order("dateFrom", "dateTo")
        .response(object_with_arrays(&["stays"])),
        ToolSpec::new(
            "merge_guest_profiles",
            HttpMethod::Post,
            "/crm/v1/profiles/{profileId}/merges",
            "Merge a duplicate guest profile into a primary profile",
        )
        .param(hotel_query())
        .param(ParamDef::path("primaryProfileId", ParamType::Identifier, "Profile that survives the merge").wire("profileId"))
        .param(ParamDef::body("duplicateProfileId", ParamType::Identifier, "Profile merged away").wire("merge.sourceProfileId"))
        .param(ParamDef::body("mergePreferences", ParamType::Bool, "Carry over preferences").wire("merge.preferences").with_default(json!(true)))
        .param(ParamDef::body("mergeHistory", ParamType::Bool, "Carry over stay history").wire("merge.history").with_default(json!(true)))
        .param(ParamDef::body("mergeLoyalty", ParamType::Bool, "Carry over memberships").wire("merge.memberships").with_default(json!(true)))
        .distinct("primaryProfileId", "duplicateProfileId")
        .response(any_object()),
        ToolSpec::new(
            "get_guest_loyalty_info",
            HttpMethod::Get,
            "/crm/v1/profiles/{profileId}/memberships",
            "Loyalty memberships, tier and points of a guest",
        )
        .param(hotel_query())
        .param(profile_path())
        .response(object_with_arrays(&["memberships"])),
    ]
}

// =============================================================================
// Front office
// =============================================================================

fn front_office_tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            "check_in_guest",
            HttpMethod::Post,
            "/fof/v1/hotels/{hotelId}/reservations/{reservationId}/checkIns",
            "Check a guest in",
        )
        .param(hotel_path())
        .param(reservation_path())
        .param(ParamDef::body("roomNumber", opt(ParamType::Identifier), "Room to assign at check-in").wire("reservation.roomId"))
        .param(ParamDef::body("specialRequests", opt(ParamType::String), "Notes for the front desk").wire("reservation.comments"))
        .param(ParamDef::body("keyCardsIssued", ParamType::IntRange { min: 0, max: 10 }, "Key cards issued").with_default(json!(2)))
        .param(ParamDef::body("idVerified", ParamType::Bool, "Guest identification verified").with_default(json!(true)))
        .response(any_object()),
        ToolSpec::new(
            "check_out_guest",
            HttpMethod::Post,
            "/fof/v1/hotels/{hotelId}/reservations/{reservationId}/checkOuts",
            "Check a guest out",
        )
        .param(hotel_path())
        .param(reservation_path())
        .param(ParamDef::body("expressCheckout", ParamType::Bool, "Skip folio review").with_default(json!(false)))
        .param(ParamDef::body("keyCardsReturned", ParamType::IntRange { min: 0, max: 10 }, "Key cards returned").with_default(json!(0)))
        .param(ParamDef::body("roomDamages", opt(ParamType::String), "Damage notes"))
        .response(any_object()),
        ToolSpec::new(
            "assign_room",
            HttpMethod::Put,
            "/fof/v1/hotels/{hotelId}/reservations/{reservationId}/roomAssignments",
            "Assign or upgrade the room of a reservation",
        )
        .param(hotel_path())
        .param(reservation_path())
        .param(ParamDef::body("roomNumber", ParamType::Identifier, "Room number").wire("roomId"))
        .param(ParamDef::body("upgradeReason", opt(ParamType::String), "Reason for an upgrade"))
        .response(any_object()),
        ToolSpec::new(
            "get_arrivals_report",
            HttpMethod::Get,
            "/fof/v1/hotels/{hotelId}/arrivals",
            "List expected arrivals for a date",
        )
        .param(hotel_path())
        .param(ParamDef::query("reportDate", opt(ParamType::Date), "Business date (defaults to today at the property)").wire("arrivalDate"))
        .param(ParamDef::query("status", opt(ParamType::String), "Arrival status filter"))
        .param(ParamDef::query("roomType", opt(ParamType::String), "Room type code"))
        .response(object_with_arrays(&["arrivals"])),
        ToolSpec::new(
            "get_departures_report",
            HttpMethod::Get,
            "/fof/v1/hotels/{hotelId}/departures",
            "List expected departures for a date",
        )
        .param(hotel_path())
        .param(ParamDef::query("reportDate", opt(ParamType::Date), "Business date").wire("departureDate"))
        .param(ParamDef::query("checkoutStatus", opt(ParamType::String), "Checkout status filter"))
        .response(object_with_arrays(&["departures"])),
        ToolSpec::new(
            "get_in_house_guests",
            HttpMethod::Get,
            "/fof/v1/hotels/{hotelId}/inHouseGuests",
            "List guests currently in house",
        )
        .param(hotel_path())
        .param(ParamDef::query("searchTerm", opt(ParamType::String), "Name or room search").wire("searchText"))
        .param(ParamDef::query("roomNumber", opt(ParamType::Identifier), "Room number").wire("roomId"))
        .param(ParamDef::query("vipOnly", ParamType::Bool, "Only VIP guests").with_default(json!(false)))
        .response(object_with_arrays(&["guests"])),
        ToolSpec::new(
            "process_walk_in",
            HttpMethod::Post,
            "/fof/v1/hotels/{hotelId}/walkIns",
            "Create a same-day reservation for a walk-in guest and check them in",
        )
        .param(hotel_path())
        .param(ParamDef::body("guestFirstName", ParamType::String, "Guest first name").wire("reservation.guest.givenName"))
        .param(ParamDef::body("guestLastName", ParamType::String, "Guest last name").wire("reservation.guest.surname"))
        .param(ParamDef::body("guestEmail", opt(ParamType::String), "Guest email").wire("reservation.guest.email"))
        .param(ParamDef::body("guestPhone", opt(ParamType::String), "Guest phone").wire("reservation.guest.phone"))
        .param(ParamDef::body("roomType", ParamType::String, "Room type code").wire("reservation.stay.roomType"))
        .param(ParamDef::body("nights", ParamType::IntRange { min: 1, max: 30 }, "Length of stay in nights").wire("reservation.stay.nights"))
        .param(ParamDef::body("rateCode", ParamType::String, "Rate plan code").wire("reservation.stay.ratePlanCode"))
        .param(ParamDef::body("specialRequests", opt(ParamType::String), "Free-text requests").wire("reservation.comments"))
        .param(ParamDef::body("creditCardRequired", ParamType::Bool, "Require a card guarantee").wire("reservation.guarantee.creditCardRequired").with_default(json!(true)))
        .response(any_object()),
        ToolSpec::new(
            "get_occupancy_report",
            HttpMethod::Get,
            "/fof/v1/hotels/{hotelId}/occupancy",
            "Occupancy statistics by room type for a date",
        )
        .param(hotel_path())
        .param(ParamDef::query("reportDate", opt(ParamType::Date), "Business date").wire("businessDate"))
        .response(any_object()),
        ToolSpec::new(
            "get_no_show_report",
            HttpMethod::Get,
            "/fof/v1/hotels/{hotelId}/noShows",
            "Reservations that did not arrive on a date",
        )
        .param(hotel_path())
        .param(ParamDef::query("reportDate", opt(ParamType::Date), "Business date").wire("arrivalDate"))
        .response(object_with_arrays(&["reservations"])),
        ToolSpec::new(
            "get_front_desk_summary",
            HttpMethod::Get,
            "/fof/v1/hotels/{hotelId}/summary",
            "Arrivals, departures, occupancy and no-shows for a date",
        )
        .param(hotel_path())
        .param(ParamDef::query("summaryDate", opt(ParamType::Date), "Business date").wire("businessDate"))
        .response(any_object()),
    ]
}

// =============================================================================
// Housekeeping
// =============================================================================

fn housekeeping_tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            "get_room_status",
            HttpMethod::Get,
            "/hsk/v1/hotels/{hotelId}/rooms",
            "Get housekeeping status of rooms",
        )
        .param(hotel_path())
        .param(ParamDef::query("roomNumber", opt(ParamType::Identifier), "Single room").wire("roomId"))
        .param(ParamDef::query("floor", opt(ParamType::String), "Floor"))
        .param(ParamDef::query("roomType", opt(ParamType::String), "Room type code"))
        .param(ParamDef::query("status", opt(variants(ROOM_STATUSES)), "Housekeeping status filter").wire("housekeepingRoomStatus"))
        .response(object_with_arrays(&["rooms"])),
        ToolSpec::new(
            "update_room_status",
            HttpMethod::Put,
            "/hsk/v1/hotels/{hotelId}/rooms/{roomNumber}/status",
            "Set the housekeeping status of a room",
        )
        .param(hotel_path())
        .param(ParamDef::path("roomNumber", ParamType::Identifier, "Room number"))
        .param(ParamDef::body("status", variants(ROOM_STATUSES), "New housekeeping status").wire("housekeepingRoomStatus"))
        .param(ParamDef::body("notes", opt(ParamType::String), "Notes"))
        .param(ParamDef::body("maintenanceRequired", ParamType::Bool, "Flag for maintenance").with_default(json!(false)))
        .response(any_object()),
        ToolSpec::new(
            "get_housekeeping_tasks",
            HttpMethod::Get,
            "/hsk/v1/hotels/{hotelId}/tasks",
            "List housekeeping tasks",
        )
        .param(hotel_path())
        .param(ParamDef::query("taskDate", opt(ParamType::Date), "Task date"))
        .param(ParamDef::query("roomNumber", opt(ParamType::Identifier), "Room number").wire("roomId"))
        .param(ParamDef::query("taskStatus", opt(ParamType::String), "Task status"))
        .param(ParamDef::query("assignedTo", opt(ParamType::String), "Attendant"))
        .response(object_with_arrays(&["tasks"])),
        ToolSpec::new(
            "create_housekeeping_task",
            HttpMethod::Post,
            "/hsk/v1/hotels/{hotelId}/tasks",
            "Create a housekeeping task for a room",
        )
        .param(hotel_path())
        .param(ParamDef::body("roomNumber", ParamType::Identifier, "Room number").wire("task.roomId"))
        .param(ParamDef::body("taskType", ParamType::String, "Task type code").wire("task.taskCode"))
        .param(ParamDef::body("priority", variants(PRIORITIES), "Priority").wire("task.priority").with_default(json!("normal")))
        .param(ParamDef::body("description", opt(ParamType::String), "Instructions").wire("task.instructions"))
        .param(ParamDef::body("assignedTo", opt(ParamType::String), "Attendant").wire("task.attendant"))
        .param(ParamDef::body("dueDate", opt(ParamType::Date), "Due date").wire("task.dueDate"))
        .response(any_object()),
        ToolSpec::new(
            "create_maintenance_request",
            HttpMethod::Post,
            "/hsk/v1/hotels/{hotelId}/maintenanceRequests",
            "Open a maintenance request for a room",
        )
        .param(hotel_path())
        .param(ParamDef::body("roomNumber", ParamType::Identifier, "Room number").wire("maintenance.roomId"))
        .param(ParamDef::body("issueDescription", ParamType::String, "What is wrong").wire("maintenance.description"))
        .param(ParamDef::body("priority", variants(PRIORITIES), "Priority").wire("maintenance.priority").with_default(json!("normal")))
        .param(ParamDef::body("category", opt(variants(&["electrical", "plumbing", "hvac", "furniture", "other"])), "Maintenance category").wire("maintenance.category"))
        .param(ParamDef::body("estimatedCost", opt(ParamType::Number), "Estimated cost").wire("maintenance.estimatedCost"))
        .param(ParamDef::body("vendorRequired", ParamType::Bool, "Needs an outside vendor").wire("maintenance.vendorRequired").with_default(json!(false)))
        .response(any_object()),
        ToolSpec::new(
            "get_cleaning_schedule",
            HttpMethod::Get,
            "/hsk/v1/hotels/{hotelId}/cleaningSchedule",
            "Room cleaning schedule for a date",
        )
        .param(hotel_path())
        .param(ParamDef::query("scheduleDate", opt(ParamType::Date), "Schedule date"))
        .param(ParamDef::query("roomType", opt(ParamType::String), "Room type code"))
        .param(ParamDef::query("staffMember", opt(ParamType::String), "Attendant").wire("attendant"))
        .response(object_with_arrays(&["rooms"])),
        ToolSpec::new(
            "get_inventory_status",
            HttpMethod::Get,
            "/inv/v1/hotels/{hotelId}/items",
            "Stock levels of hotel inventory items",
        )
        .param(hotel_path())
        .param(ParamDef::query("itemCategory", opt(ParamType::String), "Item category").wire("category"))
        .param(ParamDef::query("location", opt(ParamType::String), "Storage location"))
        .param(ParamDef::query("lowStockOnly", ParamType::Bool, "Only items below their reorder level").with_default(json!(false)))
        .response(object_with_arrays(&["items"])),
        ToolSpec::new(
            "update_inventory_stock",
            HttpMethod::Post,
            "/inv/v1/hotels/{hotelId}/items/{itemId}/adjustments",
            "Adjust the stock level of an inventory item",
        )
        .param(hotel_path())
        .param(ParamDef::path("itemId", ParamType::Identifier, "Inventory item id"))
        .param(ParamDef::body("quantityAdjustment", ParamType::Int, "Quantity change, negative to remove").wire("adjustment.quantity"))
        .param(ParamDef::body("adjustmentReason", variants(STOCK_REASONS), "Reason for the change").wire("adjustment.reason"))
        .param(ParamDef::body("location", opt(ParamType::String), "Storage location").wire("adjustment.location"))
        .param(ParamDef::body("notes", opt(ParamType::String), "Notes").wire("adjustment.remark"))
        .response(any_object()),
    ]
}

// =============================================================================
// Cashiering
// =============================================================================

fn cashiering_tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            "get_guest_folio",
            HttpMethod::Get,
            "/csh/v1/hotels/{hotelId}/reservations/{reservationId}/folios",
            "Get the folio of a reservation",
        )
        .param(hotel_path())
        .param(reservation_path())
        .param(ParamDef::query("folioType", variants(&["master", "individual", "group"]), "Folio type").with_default(json!("master")))
        .param(ParamDef::query("includeDetails", ParamType::Bool, "Include postings").with_default(json!(true)))
        .response(object_with_arrays(&["folios"])),
        ToolSpec::new(
            "post_charge_to_room",
            HttpMethod::Post,
            "/csh/v1/hotels/{hotelId}/reservations/{reservationId}/charges",
            "Post a charge to a guest folio",
        )
        .param(hotel_path())
        .param(reservation_path())
        .param(ParamDef::body("amount", ParamType::Number, "Charge amount").wire("charge.amount"))
        .param(ParamDef::body("description", ParamType::String, "Posting description").wire("charge.remark"))
        .param(ParamDef::body("departmentCode", ParamType::Identifier, "Transaction code").wire("charge.transactionCode"))
        .param(ParamDef::body("taxAmount", opt(ParamType::Number), "Tax amount").wire("charge.taxAmount"))
        .param(ParamDef::body("referenceNumber", opt(ParamType::String), "External reference").wire("charge.reference"))
        .param(ParamDef::body("postingDate", opt(ParamType::Date), "Posting date").wire("charge.postingDate"))
        .response(any_object()),
        ToolSpec::new(
            "process_payment",
            HttpMethod::Post,
            "/csh/v1/hotels/{hotelId}/reservations/{reservationId}/payments",
            "Apply a payment to a guest folio",
        )
        .param(hotel_path())
        .param(reservation_path())
        .param(ParamDef::body("amount", ParamType::Number, "Payment amount").wire("payment.amount"))
        .param(ParamDef::body("paymentMethod", variants(&["cash", "credit_card", "debit_card", "check", "bank_transfer", "direct_bill"]), "Payment method").wire("payment.paymentMethod"))
        .param(ParamDef::body("referenceNumber", opt(ParamType::String), "External reference").wire("payment.reference"))
        .param(ParamDef::body("notes", opt(ParamType::String), "Notes").wire("payment.remark"))
        .param(ParamDef::body("applyToBalance", ParamType::Bool, "Apply against the open balance").with_default(json!(true)))
        .response(any_object()),
        ToolSpec::new(
            "get_daily_revenue_report",
            HttpMethod::Get,
            "/csh/v1/hotels/{hotelId}/revenue",
            "Revenue summary for a business date",
        )
        .param(hotel_path())
        .param(ParamDef::query("reportDate", opt(ParamType::Date), "Business date").wire("businessDate"))
        .param(ParamDef::query("includeDepartments", ParamType::Bool, "Break down by department").with_default(json!(true)))
        .param(ParamDef::query("includePaymentMethods", ParamType::Bool, "Break down by payment method").with_default(json!(true)))
        .response(any_object()),
        ToolSpec::new(
            "process_refund",
            HttpMethod::Post,
            "/csh/v1/hotels/{hotelId}/reservations/{reservationId}/refunds",
            "Refund an amount from a guest folio",
        )
        .param(hotel_path())
        .param(reservation_path())
        .param(ParamDef::body("amount", ParamType::Number, "Refund amount").wire("refund.amount"))
        .param(ParamDef::body("refundReason", ParamType::String, "Reason for the refund").wire("refund.reason"))
        .param(ParamDef::body("refundMethod", variants(REFUND_METHODS), "How the refund is paid").wire("refund.method").with_default(json!("original_payment")))
        .param(ParamDef::body("originalTransactionId", opt(ParamType::Identifier), "Payment being refunded").wire("refund.originalTransactionId"))
        .param(ParamDef::body("notes", opt(ParamType::String), "Notes").wire("refund.remark"))
        .response(any_object()),
        ToolSpec::new(
            "void_transaction",
            HttpMethod::Post,
            "/csh/v1/hotels/{hotelId}/reservations/{reservationId}/transactions/{transactionId}/voids",
            "Void a posted folio transaction",
        )
        .param(hotel_path())
        .param(reservation_path())
        .param(ParamDef::path("transactionId", ParamType::Identifier, "Transaction to void"))
        .param(ParamDef::body("voidReason", ParamType::String, "Reason for the void").wire("reason"))
        .param(ParamDef::body("managerOverride", opt(ParamType::String), "Manager approval code"))
        .response(any_object()),
        ToolSpec::new(
            "transfer_charges",
            HttpMethod::Post,
            "/csh/v1/hotels/{hotelId}/reservations/{reservationId}/chargeTransfers",
            "Move charges from one reservation folio to another",
        )
        .param(hotel_path())
        .param(reservation_path())
        .param(ParamDef::body("toReservationId", ParamType::Identifier, "Reservation receiving the charges").wire("transfer.targetReservationId"))
        .param(ParamDef::body("charges", ParamType::ObjectList, "Charges to move, each with chargeId, amount and description").wire("transfer.charges"))
        .param(ParamDef::body("transferReason", opt(ParamType::String), "Reason for the transfer").wire("transfer.reason"))
        .distinct("reservationId", "toReservationId")
        .response(any_object()),
        ToolSpec::new(
            "get_outstanding_balances",
            HttpMethod::Get,
            "/csh/v1/hotels/{hotelId}/balances",
            "Folios with an open balance",
        )
        .param(hotel_path())
        .param(ParamDef::query("balanceThreshold", ParamType::Number, "Minimum balance to include").with_default(json!(0.01)))
        .param(ParamDef::query("includeDeparted", ParamType::Bool, "Include guests who already left").with_default(json!(true)))
        .param(ParamDef::query("daysBack", ParamType::IntRange { min: 0, max: 90 }, "Days back to look for departed guests").with_default(json!(7)))
        .response(object_with_arrays(&["balances"])),
        ToolSpec::new(
            "generate_folio_report",
            HttpMethod::Get,
            "/csh/v1/hotels/{hotelId}/reservations/{reservationId}/folioReport",
            "Printable folio report for a reservation",
        )
        .param(hotel_path())
        .param(reservation_path())
        .param(ParamDef::query("formatType", variants(&["detailed", "summary", "itemized"]), "Report layout").wire("format").with_default(json!("detailed")))
        .param(ParamDef::query("includeZeroAmounts", ParamType::Bool, "Include zero-amount postings").with_default(json!(false)))
        .response(any_object()),
    ]
}

// =============================================================================
// Activities and dining
// =============================================================================

fn activity_tools() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            "create_dining_reservation",
            HttpMethod::Post,
            "/act/v1/hotels/{hotelId}/restaurants/{restaurantId}/reservations",
            "Book a table at a hotel restaurant",
        )
        .param(hotel_path())
        .param(ParamDef::path("restaurantId", ParamType::Identifier, "Restaurant id"))
        .param(ParamDef::body("guestName", ParamType::String, "Name for the booking").wire("booking.guestName"))
        .param(ParamDef::body("reservationDate", ParamType::Date, "Date (YYYY-MM-DD)").wire("booking.date"))
        .param(ParamDef::body("reservationTime", ParamType::Time, "Time (HH:MM)").wire("booking.time"))
        .param(ParamDef::body("partySize", ParamType::IntRange { min: 1, max: 20 }, "Number of diners").wire("booking.partySize"))
        .param(ParamDef::body("guestRoom", opt(ParamType::Identifier), "Room to charge").wire("booking.roomId"))
        .param(ParamDef::body("specialRequests", opt(ParamType::String), "Special requests").wire("booking.comments"))
        .param(ParamDef::body("dietaryRestrictions", opt(ParamType::String), "Dietary restrictions").wire("booking.dietaryRestrictions"))
        .response(any_object()),
        ToolSpec::new(
            "create_activity_booking",
            HttpMethod::Post,
            "/act/v1/hotels/{hotelId}/activities/{activityId}/bookings",
            "Book a hotel activity for a guest",
        )
        .param(hotel_path())
        .param(ParamDef::path("activityId", ParamType::Identifier, "Activity id"))
        .param(ParamDef::body("guestName", ParamType::String, "Name for the booking").wire("booking.guestName"))
        .param(ParamDef::body("bookingDate", ParamType::Date, "Date (YYYY-MM-DD)").wire("booking.date"))
        .param(ParamDef::body("startTime", ParamType::Time, "Start time (HH:MM)").wire("booking.startTime"))
        .param(ParamDef::body("participants", ParamType::IntRange { min: 1, max: 50 }, "Number of participants").wire("booking.participants"))
        .param(ParamDef::body("guestRoom", opt(ParamType::Identifier), "Room to charge").wire("booking.roomId"))
        .param(ParamDef::body("specialRequirements", opt(ParamType::String), "Special requirements").wire("booking.comments"))
        .response(any_object()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolRegistry;
    use serde_json::{Map, Value};

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_every_hotel_tool_accepts_default_hotel() {
        let registry = ToolRegistry::opera().unwrap();
        for tool in registry.list_tools() {
            if let Some(hotel) = tool.param(HOTEL_ID_PARAM) {
                assert!(
                    tool.input_schema(true)["required"]
                        .as_array()
                        .is_some_and(|r| !r.contains(&json!(HOTEL_ID_PARAM))),
                    "{} lists hotelId as required with a default hotel",
                    tool.name
                );
                assert!(!hotel.description.is_empty());
            }
        }
    }

    #[test]
    fn test_create_reservation_body_shape() {
        let registry = ToolRegistry::opera().unwrap();
        let tool = registry.resolve("create_reservation").unwrap();
        let prepared = tool
            .prepare(
                &args(json!({
                    "guestFirstName": "Ada",
                    "guestLastName": "Lovelace",
                    "arrivalDate": "2025-07-01",
                    "departureDate": "2025-07-03",
                    "roomType": "KING",
                    "rateCode": "BAR"
                })),
                Some("SAND01"),
            )
            .unwrap();
        assert_eq!(prepared.path_value("hotelId"), Some("SAND01"));
        let body = Value::Object(prepared.body.unwrap());
        assert_eq!(body["reservation"]["guest"]["givenName"], "Ada");
        assert_eq!(body["reservation"]["stay"]["adults"], 1);
        assert_eq!(body["reservation"]["stay"]["children"], 0);
    }

    #[test]
    fn test_availability_rejects_inverted_stay() {
        let registry = ToolRegistry::opera().unwrap();
        let tool = registry.resolve("check_room_availability").unwrap();
        let err = tool
            .prepare(
                &args(json!({"hotelId": "H1", "arrivalDate": "2025-07-03", "departureDate": "2025-07-01"})),
                None,
            )
            .unwrap_err();
        assert!(err.to_string().contains("departureDate must be after arrivalDate"));
    }

    #[test]
    fn test_room_status_enum() {
        let registry = ToolRegistry::opera().unwrap();
        let tool = registry.resolve("update_room_status").unwrap();
        assert!(tool
            .prepare(&args(json!({"hotelId": "H1", "roomNumber": "101", "status": "Clean"})), None)
            .is_ok());
        assert!(tool
            .prepare(&args(json!({"hotelId": "H1", "roomNumber": "101", "status": "Shiny"})), None)
            .is_err());
    }

    #[test]
    fn test_catalogue_names_unique() {
        let specs = catalogue();
        assert_eq!(specs.len(), 45);
        let names: std::collections::HashSet<_> = specs.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), specs.len());
    }

    #[test]
    fn test_transfer_charges_needs_two_reservations() {
        let registry = ToolRegistry::opera().unwrap();
        let tool = registry.resolve("transfer_charges").unwrap();
        let charges = json!([{"chargeId": "C1", "amount": 25.0, "description": "Minibar"}]);

        let err = tool
            .prepare(
                &args(json!({"hotelId": "H1", "reservationId": "R1", "toReservationId": "R1", "charges": charges})),
                None,
            )
            .unwrap_err();
        assert!(err.to_string().contains("reservationId and toReservationId must differ"));

        let prepared = tool
            .prepare(
                &args(json!({"hotelId": "H1", "reservationId": "R1", "toReservationId": "R2", "charges": charges})),
                None,
            )
            .unwrap();
        let body = Value::Object(prepared.body.unwrap());
        assert_eq!(body["transfer"]["targetReservationId"], "R2");
        assert_eq!(body["transfer"]["charges"][0]["chargeId"], "C1");
    }

    #[test]
    fn test_merge_profiles_binds_primary_to_path() {
        let registry = ToolRegistry::opera().unwrap();
        let tool = registry.resolve("merge_guest_profiles").unwrap();
        let prepared = tool
            .prepare(&args(json!({"primaryProfileId": "P1", "duplicateProfileId": "P2"})), None)
            .unwrap();
        assert_eq!(prepared.path_value("profileId"), Some("P1"));
        let body = Value::Object(prepared.body.unwrap());
        assert_eq!(body["merge"]["sourceProfileId"], "P2");
        assert_eq!(body["merge"]["preferences"], true);

        assert!(tool
            .prepare(&args(json!({"primaryProfileId": "P1", "duplicateProfileId": "P1"})), None)
            .is_err());
    }

    #[test]
    fn test_dining_reservation_checks_time() {
        let registry = ToolRegistry::opera().unwrap();
        let tool = registry.resolve("create_dining_reservation").unwrap();
        let mut call = json!({
            "hotelId": "H1",
            "restaurantId": "GRILL",
            "guestName": "Lovelace",
            "reservationDate": "2025-07-01",
            "reservationTime": "19:30",
            "partySize": 2
        });
        assert!(tool.prepare(&args(call.clone()), None).is_ok());

        call["reservationTime"] = json!("7:30pm");
        let err = tool.prepare(&args(call), None).unwrap_err();
        assert!(err.to_string().contains("reservationTime"));
    }
}
