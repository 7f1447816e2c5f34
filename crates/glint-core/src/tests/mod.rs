mod hook_order_tests;
