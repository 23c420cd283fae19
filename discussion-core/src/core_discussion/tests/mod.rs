/*
    Scenario tests for the discussion core

    Test suite covering:
    - Create, invite, accept and promote flows
    - Invitation expiry at and around the deadline
    - Role checks on every guarded operation
*/
